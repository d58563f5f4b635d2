//! Runs a scenario against the in-memory ad tag.

use std::rc::Rc;

use error_stack::Report;
use serde::Serialize;

use bebop_common::ad_tag::{AdSize, AdTag};
use bebop_common::bebop::Bebop;
use bebop_common::bootstrap::BebopQueue;
use bebop_common::error::{BebopError, BebopResult};
use bebop_common::memory_tag::{InMemoryAdTag, TagCall};
use bebop_common::raw::RawValue;
use bebop_common::slot::Slot;
use bebop_common::targeting::TargetingMap;

use crate::error::SimError;
use crate::scenario::{Bootstrap, RunOptions, Scenario};

/// Everything the page caused while the scenario ran.
#[derive(Debug, Serialize)]
pub struct Outcome {
    /// Active viewport category, if any matched.
    pub category: Option<String>,
    pub calls: Vec<TagCall>,
    pub headertag_calls: Vec<TagCall>,
    pub slots: Vec<SlotSummary>,
    pub failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotSummary {
    pub div_id: String,
    pub ad_unit_path: String,
    pub active: bool,
    pub defined: bool,
    pub sizes: Vec<AdSize>,
    pub targeting: TargetingMap,
}

impl SlotSummary {
    fn from_slot(slot: &Slot) -> BebopResult<Self> {
        Ok(Self {
            div_id: slot.gpt_div_id().to_string(),
            ad_unit_path: slot.ad_unit_path().to_string(),
            active: slot.is_active()?,
            defined: slot.is_defined(),
            sizes: slot.sizes()?,
            targeting: slot.targeting(),
        })
    }
}

/// Runs `scenario` to completion and collects the outcome.
///
/// Failures raised by the page's callbacks or by queued jobs are collected
/// in [`Outcome::failures`].
///
/// # Errors
///
/// Returns [`SimError::Bebop`] if the page configuration is rejected and no
/// facade could be bound.
pub fn run_scenario(scenario: &Scenario) -> Result<Outcome, Report<SimError>> {
    let tag = Rc::new(InMemoryAdTag::new());
    tag.refuse_slots(scenario.run.refuse_slots);
    let headertag = Rc::new(InMemoryAdTag::new());

    let mut queue = BebopQueue::new(Rc::clone(&tag) as Rc<dyn AdTag>);
    if scenario.page.headertag.is_some() {
        queue = queue.with_headertag(Rc::clone(&headertag) as Rc<dyn AdTag>);
    }

    let mut failures = Vec::new();
    for result in bootstrap(&mut queue, scenario) {
        if let Err(report) = result {
            log::warn!("bootstrap step failed: {report:?}");
            failures.push(report.current_context().to_string());
        }
    }

    let Some(bebop) = queue.bebop() else {
        return Err(Report::new(SimError::Bebop {
            message: failures.join("\n"),
        }));
    };

    log::info!("ad tag loaded, draining command queue");
    tag.set_loaded(true);
    headertag.set_loaded(true);
    failures.extend(
        tag.take_failures()
            .into_iter()
            .chain(headertag.take_failures())
            .map(|report| report.current_context().to_string()),
    );

    let slots = bebop
        .slots()
        .iter()
        .map(SlotSummary::from_slot)
        .collect::<BebopResult<Vec<_>>>()
        .map_err(|report| bebop_error(&report))?;
    let category = bebop
        .settings()
        .viewport()
        .and_then(|viewport| viewport.view_category())
        .map_err(|report| bebop_error(&report))?
        .map(|category| category.to_string());

    Ok(Outcome {
        category,
        calls: tag.calls(),
        headertag_calls: headertag.calls(),
        slots,
        failures,
    })
}

fn bebop_error(report: &Report<BebopError>) -> Report<SimError> {
    Report::new(SimError::Bebop {
        message: report.current_context().to_string(),
    })
}

/// Feeds the page's configuration and callback to the queue in the order the
/// scenario asks for.
fn bootstrap(queue: &mut BebopQueue, scenario: &Scenario) -> Vec<BebopResult<()>> {
    let config = scenario.page_config();
    let callback = page_callback(
        scenario.slot_configs(),
        scenario.page_targets(),
        scenario.run.clone(),
    );

    match scenario.run.bootstrap {
        Bootstrap::Inline => vec![queue.push(callback), queue.init(Some(config))],
        Bootstrap::Queued => vec![
            queue.push(callback),
            queue.unshift(move || config),
            queue.init(None),
        ],
        Bootstrap::Late => vec![
            queue.init(None),
            queue.unshift(move || config),
            queue.push(callback),
        ],
    }
}

fn page_callback(
    slot_configs: RawValue,
    page_targets: RawValue,
    options: RunOptions,
) -> impl FnOnce(&Bebop) -> BebopResult<()> + 'static {
    move |bebop: &Bebop| {
        let slots = bebop.define_slots(&slot_configs)?;
        bebop.set_page_targets(&page_targets)?;
        if options.display {
            bebop.display(&slots);
        }
        if let Some(refresh) = options.refresh {
            bebop.refresh(None, Some(refresh));
        }
        Ok(())
    }
}
