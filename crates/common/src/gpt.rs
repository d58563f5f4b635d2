//! Command-queue handler for the ad tag.
//!
//! [`GptHandler`] is the only code that talks to the [`AdTag`]. Each of its
//! operations pushes exactly one job onto the tag's command queue, so nothing
//! touches the tag before the tag is ready to drain its queue.
//!
//! ## Dispatch tag
//!
//! `display` and `refresh` go to a dispatch tag chosen when the job runs:
//! the headertag adapter when headertag is enabled, its reference reports
//! `apiReady: true` and an adapter was supplied, and the ad tag otherwise.
//! With `disableInitialLoad` set, `display` always goes to the ad tag.

use std::rc::Rc;

use error_stack::Report;

use crate::ad_tag::{AdSize, AdTag, RefreshOptions, SlotHandle};
use crate::error::{BebopError, BebopResult};
use crate::logging::advisory;
use crate::settings::PageSettings;
use crate::targeting::TargetingValue;

/// Callback that receives the slot handle created by a define job, or the
/// failure when the ad tag created none. Whatever it returns is the job's
/// result.
pub type Register = Box<dyn FnOnce(BebopResult<SlotHandle>) -> BebopResult<()>>;

/// Wraps the ad tag's command queue.
#[derive(Clone)]
pub struct GptHandler {
    tag: Rc<dyn AdTag>,
    headertag: Option<Rc<dyn AdTag>>,
    settings: Rc<PageSettings>,
}

impl GptHandler {
    #[must_use]
    pub fn new(tag: Rc<dyn AdTag>, settings: Rc<PageSettings>) -> Self {
        Self {
            tag,
            headertag: None,
            settings,
        }
    }

    /// Supplies the adapter used when headertag is enabled and ready.
    #[must_use]
    pub fn with_headertag(mut self, headertag: Rc<dyn AdTag>) -> Self {
        self.headertag = Some(headertag);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &Rc<PageSettings> {
        &self.settings
    }

    /// Pushes `job` onto the ad tag's command queue. The job receives the
    /// handler and the dispatch tag resolved at the time it runs.
    pub fn q<F>(&self, job: F)
    where
        F: FnOnce(&GptHandler, Rc<dyn AdTag>) -> BebopResult<()> + 'static,
    {
        let handler = self.clone();
        self.tag.push_command(Box::new(move || {
            let tag = handler.dispatch_tag()?;
            job(&handler, tag)
        }));
    }

    fn dispatch_tag(&self) -> BebopResult<Rc<dyn AdTag>> {
        let headertag = self.settings.headertag()?;
        if !headertag.enabled()? {
            return Ok(Rc::clone(&self.tag));
        }

        let ready = headertag.reference()?.get("apiReady").as_bool() == Some(true);
        match (&self.headertag, ready) {
            (Some(adapter), true) => Ok(Rc::clone(adapter)),
            _ => {
                advisory!(
                    "headertag reference is not available or its API is not ready, using the ad tag instead"
                );
                Ok(Rc::clone(&self.tag))
            }
        }
    }

    /// Queues `defineSlot` and hands the created handle to `register`.
    pub fn define_slot(
        &self,
        ad_unit_path: String,
        sizes: Vec<AdSize>,
        div_id: String,
        register: Register,
    ) {
        self.q(move |handler, _| {
            let handle = handler.tag.define_slot(&ad_unit_path, &sizes, &div_id);
            handler.register_slot(handle, &div_id, register)
        });
    }

    /// Queues `defineOutOfPageSlot` and hands the created handle to `register`.
    pub fn define_out_of_page_slot(&self, ad_unit_path: String, div_id: String, register: Register) {
        self.q(move |handler, _| {
            let handle = handler.tag.define_out_of_page_slot(&ad_unit_path, &div_id);
            handler.register_slot(handle, &div_id, register)
        });
    }

    /// Adds the page service to a new slot and passes it on.
    ///
    /// When the tag did not create a slot, `register` receives a
    /// [`BebopError::ExternalFailure`] instead.
    ///
    /// # Errors
    ///
    /// Returns whatever `register` returns.
    pub fn register_slot(
        &self,
        handle: Option<SlotHandle>,
        div_id: &str,
        register: Register,
    ) -> BebopResult<()> {
        let Some(handle) = handle else {
            return register(Err(Report::new(BebopError::ExternalFailure {
                message: format!("could not create slot for div {div_id}"),
            })));
        };
        handle.add_service(self.tag.pubads());
        register(Ok(handle))
    }

    pub fn display(&self, div_id: String) {
        self.q(move |handler, tag| {
            if handler.settings.gpt()?.disable_initial_load()? {
                handler.tag.display(&div_id);
            } else {
                tag.display(&div_id);
            }
            Ok(())
        });
    }

    /// Queues `pubads().refresh()`. `None` refreshes every slot.
    pub fn refresh(&self, slots: Option<Vec<SlotHandle>>, options: Option<RefreshOptions>) {
        self.q(move |_, tag| {
            tag.pubads().refresh(slots.as_deref(), options.as_ref());
            Ok(())
        });
    }

    pub fn set_slot_targeting(&self, handle: SlotHandle, key: String, value: TargetingValue) {
        self.q(move |_, _| {
            handle.set_targeting(&key, &value);
            Ok(())
        });
    }

    /// Queues removal of every slot-level targeting entry.
    pub fn clear_slot_targeting(&self, handle: SlotHandle) {
        self.q(move |_, _| {
            handle.clear_targeting();
            Ok(())
        });
    }

    pub fn set_page_targeting(&self, key: String, value: TargetingValue) {
        self.q(move |handler, _| {
            handler.tag.pubads().set_targeting(&key, &value);
            Ok(())
        });
    }

    /// Asks the host to load the ad tag library when `loadTag` is set.
    /// Returns whether a load was requested.
    ///
    /// This cannot go through the command queue: the queue only drains once
    /// the library is loaded.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the page settings are
    /// invalid.
    pub fn load_tag(&self) -> BebopResult<bool> {
        if !self.settings.gpt()?.load_tag()? {
            return Ok(false);
        }
        log::info!("loading ad tag library");
        self.tag.load();
        Ok(true)
    }
}
