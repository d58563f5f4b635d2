//! The page-level bootstrap queue.
//!
//! Page script can start handing callbacks to the library before the library
//! or its configuration has loaded. [`BebopQueue`] defers those callbacks
//! until configuration is available, then hands each of them the [`Bebop`]
//! facade. Configuration arrives either directly through
//! [`BebopQueue::init`], as the first deferred entry, or late through
//! [`BebopQueue::unshift`].

use std::collections::VecDeque;
use std::rc::Rc;

use error_stack::Report;

use crate::ad_tag::AdTag;
use crate::bebop::Bebop;
use crate::error::{BebopError, BebopResult};
use crate::gpt::GptHandler;
use crate::logging::advisory;
use crate::raw::RawValue;
use crate::settings::create_page_settings;

const ORDERING_MESSAGE: &str = "page configuration has not been passed to bebop yet. When bebop \
     and its configuration load asynchronously, the configuration must be bound with \
     unshift(provider), where the provider returns the configuration object";

/// A callback that uses the facade.
pub type ApiCallback = Box<dyn FnOnce(&Bebop) -> BebopResult<()>>;

/// A callback that returns the page configuration.
pub type ConfigProvider = Box<dyn FnOnce() -> RawValue>;

/// An entry deferred until configuration is available.
pub enum QueuedCallback {
    Api(ApiCallback),
    Config(ConfigProvider),
}

enum QueueState {
    /// `init` has not run yet.
    Pending(VecDeque<QueuedCallback>),
    /// `init` ran without configuration; callbacks deferred so far are kept
    /// until configuration is bound.
    WaitingOnConfig(VecDeque<QueuedCallback>),
    Ready(Rc<Bebop>),
}

/// Global callback queue wired to one ad tag.
pub struct BebopQueue {
    tag: Rc<dyn AdTag>,
    headertag: Option<Rc<dyn AdTag>>,
    state: QueueState,
}

impl BebopQueue {
    #[must_use]
    pub fn new(tag: Rc<dyn AdTag>) -> Self {
        Self {
            tag,
            headertag: None,
            state: QueueState::Pending(VecDeque::new()),
        }
    }

    /// Supplies the headertag adapter handed to the facade's handler.
    #[must_use]
    pub fn with_headertag(mut self, headertag: Rc<dyn AdTag>) -> Self {
        self.headertag = Some(headertag);
        self
    }

    /// The facade, once configuration has been bound.
    #[must_use]
    pub fn bebop(&self) -> Option<Rc<Bebop>> {
        match &self.state {
            QueueState::Ready(bebop) => Some(Rc::clone(bebop)),
            QueueState::Pending(_) | QueueState::WaitingOnConfig(_) => None,
        }
    }

    #[must_use]
    pub fn is_waiting_on_config(&self) -> bool {
        matches!(self.state, QueueState::WaitingOnConfig(_))
    }

    /// Number of deferred entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            QueueState::Pending(queue) | QueueState::WaitingOnConfig(queue) => queue.len(),
            QueueState::Ready(_) => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Defers `callback` until configuration is bound, or runs it right away
    /// once it is.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::OrderingViolation`] while the queue is
    /// waiting on late configuration, and with whatever `callback` returns.
    pub fn push<F>(&mut self, callback: F) -> BebopResult<()>
    where
        F: FnOnce(&Bebop) -> BebopResult<()> + 'static,
    {
        match &mut self.state {
            QueueState::Pending(queue) => {
                queue.push_back(QueuedCallback::Api(Box::new(callback)));
                Ok(())
            }
            QueueState::WaitingOnConfig(_) => Err(ordering_violation()),
            QueueState::Ready(bebop) => callback(bebop.as_ref()),
        }
    }

    /// Defers a configuration provider.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::OrderingViolation`] while the queue is
    /// waiting on late configuration; use [`BebopQueue::unshift`] then.
    pub fn push_config<F>(&mut self, provider: F) -> BebopResult<()>
    where
        F: FnOnce() -> RawValue + 'static,
    {
        match &mut self.state {
            QueueState::Pending(queue) => {
                queue.push_back(QueuedCallback::Config(Box::new(provider)));
                Ok(())
            }
            QueueState::WaitingOnConfig(_) => Err(ordering_violation()),
            QueueState::Ready(_) => {
                advisory!("ignoring configuration provider, configuration is already bound");
                Ok(())
            }
        }
    }

    /// Puts a configuration provider first in line. While waiting on
    /// configuration this binds it immediately and runs the callbacks
    /// deferred so far.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when late configuration is
    /// invalid, and with the first failing deferred callback.
    pub fn unshift<F>(&mut self, provider: F) -> BebopResult<()>
    where
        F: FnOnce() -> RawValue + 'static,
    {
        match &mut self.state {
            QueueState::Pending(queue) => {
                queue.push_front(QueuedCallback::Config(Box::new(provider)));
                Ok(())
            }
            QueueState::WaitingOnConfig(queue) => {
                log::warn!("page configuration was bound late");
                let deferred = std::mem::take(queue);
                self.bind(&provider(), deferred)
            }
            QueueState::Ready(_) => {
                advisory!("ignoring configuration provider, configuration is already bound");
                Ok(())
            }
        }
    }

    /// Binds configuration and runs everything deferred so far.
    ///
    /// Without `config`, the first deferred entry must be a configuration
    /// provider. With an empty queue the queue waits for
    /// [`BebopQueue::unshift`].
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::OrderingViolation`] when called twice or when
    /// a callback is queued ahead of the configuration,
    /// [`BebopError::InvalidState`] when the configuration is invalid, and
    /// with the first failing deferred callback.
    pub fn init(&mut self, config: Option<RawValue>) -> BebopResult<()> {
        let QueueState::Pending(queue) = &mut self.state else {
            return Err(Report::new(BebopError::OrderingViolation {
                message: "bebop queue is already initialized".to_string(),
            }));
        };
        let mut deferred = std::mem::take(queue);

        if let Some(config) = config {
            log::info!("page configuration found, running queue");
            return self.bind(&config, deferred);
        }

        advisory!("page configuration not set, expecting it first in the queue");
        match deferred.pop_front() {
            Some(QueuedCallback::Config(provider)) => self.bind(&provider(), deferred),
            Some(api @ QueuedCallback::Api(_)) => {
                deferred.push_front(api);
                self.state = QueueState::WaitingOnConfig(deferred);
                Err(ordering_violation())
            }
            None => {
                self.state = QueueState::WaitingOnConfig(deferred);
                Ok(())
            }
        }
    }

    fn bind(&mut self, config: &RawValue, deferred: VecDeque<QueuedCallback>) -> BebopResult<()> {
        let bebop = match self.create(config) {
            Ok(bebop) => Rc::new(bebop),
            Err(report) => {
                self.state = QueueState::WaitingOnConfig(deferred);
                return Err(report);
            }
        };
        self.state = QueueState::Ready(Rc::clone(&bebop));

        let mut first_failure = None;
        for entry in deferred {
            match entry {
                QueuedCallback::Api(callback) => {
                    if let Err(report) = callback(bebop.as_ref()) {
                        log::error!("queued callback failed: {report:?}");
                        first_failure.get_or_insert(report);
                    }
                }
                QueuedCallback::Config(_) => {
                    advisory!("ignoring configuration provider, configuration is already bound");
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    fn create(&self, config: &RawValue) -> BebopResult<Bebop> {
        let settings = create_page_settings(config)?;
        let mut handler = GptHandler::new(Rc::clone(&self.tag), Rc::new(settings));
        if let Some(headertag) = &self.headertag {
            handler = handler.with_headertag(Rc::clone(headertag));
        }
        Bebop::from_handler(handler)
    }
}

fn ordering_violation() -> Report<BebopError> {
    Report::new(BebopError::OrderingViolation {
        message: ORDERING_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_tag::InMemoryAdTag;
    use crate::test_support::tests::{page_config, raw, slot_config};
    use serde_json::json;
    use std::cell::RefCell;

    fn queue() -> (Rc<InMemoryAdTag>, BebopQueue) {
        let tag = Rc::new(InMemoryAdTag::new());
        let queue = BebopQueue::new(Rc::clone(&tag) as Rc<dyn AdTag>);
        (tag, queue)
    }

    fn valid_config() -> RawValue {
        page_config(1024.0, json!({"large": 800}))
    }

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> ApiCallback) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let make = move |name: &'static str| -> ApiCallback {
            let sink = Rc::clone(&sink);
            Box::new(move |_| {
                sink.borrow_mut().push(name);
                Ok(())
            })
        };
        (seen, make)
    }

    fn assert_ordering_violation(result: BebopResult<()>) {
        let report = result.expect_err("should be an ordering violation");
        assert!(matches!(
            report.current_context(),
            BebopError::OrderingViolation { .. }
        ));
    }

    #[test]
    fn callbacks_wait_for_init_then_run_in_order() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();

        queue.push(make("first")).expect("should defer");
        queue.push(make("second")).expect("should defer");
        assert!(seen.borrow().is_empty(), "should not run before init");
        assert_eq!(queue.len(), 2);

        queue.init(Some(valid_config())).expect("should initialize");
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
        assert!(queue.bebop().is_some());

        queue.push(make("third")).expect("should run immediately");
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn configuration_can_be_first_in_queue() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();

        queue.push_config(valid_config).expect("should defer");
        queue.push(make("api")).expect("should defer");
        queue.init(None).expect("should take configuration from the queue");

        assert_eq!(*seen.borrow(), vec!["api"]);
        assert!(queue.bebop().is_some());
    }

    #[test]
    fn unshift_before_init_moves_configuration_first() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();

        queue.push(make("api")).expect("should defer");
        queue.unshift(valid_config).expect("should defer");
        queue.init(None).expect("should find configuration first");

        assert_eq!(*seen.borrow(), vec!["api"]);
    }

    #[test]
    fn callback_ahead_of_configuration_is_an_ordering_violation() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();

        queue.push(make("early")).expect("should defer");
        assert_ordering_violation(queue.init(None));
        assert!(queue.is_waiting_on_config());

        queue.unshift(valid_config).expect("should bind late");
        assert_eq!(*seen.borrow(), vec!["early"], "should run retained callbacks");
    }

    #[test]
    fn push_while_waiting_on_configuration_fails() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();

        queue.init(None).expect("should wait for configuration");
        assert!(queue.is_waiting_on_config());
        assert_ordering_violation(queue.push(make("too early")));
        assert_ordering_violation(queue.push_config(valid_config));

        queue.unshift(valid_config).expect("should bind late");
        assert!(!queue.is_waiting_on_config());
        queue.push(make("after")).expect("should run immediately");
        assert_eq!(*seen.borrow(), vec!["after"]);
    }

    #[test]
    fn init_twice_fails() {
        let (_tag, mut queue) = queue();
        queue.init(Some(valid_config())).expect("should initialize");
        assert_ordering_violation(queue.init(Some(valid_config())));
    }

    #[test]
    fn invalid_configuration_keeps_waiting() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();
        queue.push(make("api")).expect("should defer");

        let report = queue
            .init(Some(raw(json!({}))))
            .expect_err("should reject invalid configuration");
        assert!(matches!(
            report.current_context(),
            BebopError::InvalidState { .. }
        ));
        assert!(queue.is_waiting_on_config());
        assert_eq!(queue.len(), 1);

        queue.unshift(valid_config).expect("should bind late");
        assert_eq!(*seen.borrow(), vec!["api"]);
    }

    #[test]
    fn callbacks_use_the_facade() {
        let (tag, mut queue) = queue();
        queue
            .push(|bebop| {
                let slot = bebop.define_slot(&slot_config(json!({"defineOnDisplay": true})))?;
                bebop.display(&[slot]);
                Ok(())
            })
            .expect("should defer");
        queue.init(Some(valid_config())).expect("should initialize");

        tag.drain();
        assert!(tag.take_failures().is_empty());
        let bebop = queue.bebop().expect("should be ready");
        assert!(bebop.slot("d1").is_some_and(|slot| slot.is_defined()));
    }

    #[test]
    fn failing_callback_does_not_stop_the_queue() {
        let (_tag, mut queue) = queue();
        let (seen, make) = recorder();
        queue
            .push(|_| {
                Err(Report::new(BebopError::ExternalFailure {
                    message: "boom".into(),
                }))
            })
            .expect("should defer");
        queue.push(make("after")).expect("should defer");

        assert!(queue.init(Some(valid_config())).is_err());
        assert_eq!(*seen.borrow(), vec!["after"]);
    }
}
