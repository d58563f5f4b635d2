//! The public entry object.
//!
//! [`Bebop`] validates slot configuration, keeps the page's slots by div id
//! and defers everything that touches the ad tag through its command queue.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use error_stack::Report;

use crate::ad_tag::{AdTag, RefreshOptions};
use crate::error::{BebopError, BebopResult};
use crate::gpt::GptHandler;
use crate::logging::advisory;
use crate::raw::RawValue;
use crate::settings::{create_page_settings, create_slot_settings, PageSettings};
use crate::slot::Slot;
use crate::targeting::map_from_raw;
use crate::type_tag::{enforce_type, TypeTag};

pub struct Bebop {
    handler: GptHandler,
    slots: RefCell<HashMap<String, Slot>>,
}

impl Bebop {
    /// Validates the page configuration and builds a facade over `tag`.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every page
    /// configuration error.
    pub fn create(tag: Rc<dyn AdTag>, config: &RawValue) -> BebopResult<Self> {
        let settings = create_page_settings(config)?;
        Self::from_handler(GptHandler::new(tag, Rc::new(settings)))
    }

    /// Builds a facade over an existing handler, requesting the ad tag
    /// library when the page asks for it.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the handler's page
    /// settings are invalid.
    pub fn from_handler(handler: GptHandler) -> BebopResult<Self> {
        handler.settings().check()?;
        handler.load_tag()?;
        log::info!("bebop ready");
        Ok(Self {
            handler,
            slots: RefCell::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn handler(&self) -> &GptHandler {
        &self.handler
    }

    #[must_use]
    pub fn settings(&self) -> &Rc<PageSettings> {
        self.handler.settings()
    }

    /// Validates `config`, creates the slot and registers it by div id.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every slot
    /// configuration error.
    pub fn define_slot(&self, config: &RawValue) -> BebopResult<Slot> {
        let settings = create_slot_settings(config)?;
        let slot = Slot::new(self.handler.clone(), &settings)?;

        let div_id = slot.gpt_div_id().to_string();
        if self
            .slots
            .borrow_mut()
            .insert(div_id.clone(), slot.clone())
            .is_some()
        {
            advisory!("slot {} was defined again, replacing the earlier slot", div_id);
        }
        Ok(slot)
    }

    /// Defines every slot in an array of slot configurations.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::TypeMismatch`] when `configs` is not an
    /// array, and with the first slot error otherwise. Slots defined before
    /// the failing one stay defined.
    pub fn define_slots(&self, configs: &RawValue) -> BebopResult<Vec<Slot>> {
        enforce_type(configs, &[TypeTag::Array])?;
        configs
            .as_array()
            .unwrap_or_default()
            .iter()
            .map(|config| self.define_slot(config))
            .collect()
    }

    /// Queues display of `slots`, defining any that are not defined yet.
    /// Slots that are inactive when the job runs are skipped.
    pub fn display(&self, slots: &[Slot]) {
        let slots = slots.to_vec();
        self.handler.q(move |handler, _| {
            for slot in &slots {
                if !slot.is_active()? {
                    advisory!("not displaying inactive slot {}", slot.gpt_div_id());
                    continue;
                }
                if !slot.is_defined() {
                    slot.define_slot()?;
                }
                handler.display(slot.gpt_div_id().to_string());
            }
            Ok(())
        });
    }

    /// Queues a refresh of `slots`, or of every slot when `None`. Slots
    /// that are not defined when the job runs are skipped.
    pub fn refresh(&self, slots: Option<&[Slot]>, options: Option<RefreshOptions>) {
        let slots = slots.map(<[Slot]>::to_vec);
        self.handler.q(move |handler, _| {
            let handles = slots.map(|slots| {
                slots
                    .iter()
                    .filter_map(|slot| {
                        let handle = slot.handle();
                        if handle.is_none() {
                            advisory!("not refreshing undefined slot {}", slot.gpt_div_id());
                        }
                        handle
                    })
                    .collect()
            });
            handler.refresh(handles, options);
            Ok(())
        });
    }

    /// Applies page-level targeting. Every entry is validated before any of
    /// them is queued.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::TypeMismatch`] when `targets` is not an
    /// object or any entry is invalid.
    pub fn set_page_targets(&self, targets: &RawValue) -> BebopResult<()> {
        enforce_type(targets, &[TypeTag::Object])?;
        let mut errors = Vec::new();
        let targeting = map_from_raw(targets, &mut errors);
        if !errors.is_empty() {
            return Err(Report::new(BebopError::TypeMismatch {
                message: errors.join("\n"),
            }));
        }
        for (key, value) in targeting {
            self.handler.set_page_targeting(key, value);
        }
        Ok(())
    }

    /// Looks up a slot by div id.
    #[must_use]
    pub fn slot(&self, div_id: &str) -> Option<Slot> {
        self.slots.borrow().get(div_id).cloned()
    }

    /// Every registered slot, ordered by div id.
    #[must_use]
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self.slots.borrow().values().cloned().collect();
        slots.sort_by(|a, b| a.gpt_div_id().cmp(b.gpt_div_id()));
        slots
    }
}
