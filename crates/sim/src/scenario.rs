//! Scenario files.
//!
//! A scenario describes a page (viewport width, categories, ad tag flags),
//! its slots and what the page does with them once the library is ready.
//! Scenarios are loaded from TOML and merged with environment variables
//! prefixed with `BEBOP__`. For example, `BEBOP__VIEWPORT_WIDTH=360` will
//! override `viewport_width` in the file.

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use bebop_common::ad_tag::RefreshOptions;
use bebop_common::raw::{RawObject, RawValue};

use crate::error::SimError;

/// How the page hands its configuration to the bootstrap queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bootstrap {
    /// Configuration is present when the queue is initialized.
    #[default]
    Inline,
    /// Configuration is unshifted ahead of the page's callbacks.
    Queued,
    /// Configuration arrives after the queue was initialized without it.
    Late,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Scenario {
    /// Width reported by the page's `getViewPortWidth`.
    #[validate(range(min = 0.0))]
    pub viewport_width: f64,
    #[validate(nested)]
    pub page: PageScenario,
    #[serde(default)]
    #[validate(nested)]
    pub slots: Vec<SlotScenario>,
    #[serde(default)]
    pub page_targeting: Map<String, Value>,
    #[serde(default)]
    pub run: RunOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PageScenario {
    #[serde(default)]
    pub disable_initial_load: bool,
    #[serde(default)]
    pub load_tag: bool,
    #[serde(default)]
    pub headertag: Option<HeadertagScenario>,
    /// Viewport categories in resolution order.
    #[validate(length(min = 1), nested)]
    pub categories: Vec<CategoryThreshold>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CategoryThreshold {
    #[validate(length(min = 1))]
    pub name: String,
    pub threshold: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeadertagScenario {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Value of `apiReady` on the headertag reference.
    #[serde(default)]
    pub api_ready: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SlotScenario {
    #[validate(length(min = 1))]
    pub div_id: String,
    pub ad_unit_path: String,
    #[serde(default)]
    pub interstitial: bool,
    #[serde(default)]
    pub lazyload: bool,
    #[serde(default)]
    pub define_on_display: bool,
    /// Size lists per category, for standard slots.
    #[serde(default)]
    pub sizes: Vec<CategorySizes>,
    /// Active categories, for interstitial slots.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub targeting: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategorySizes {
    pub category: String,
    pub sizes: Vec<Vec<u32>>,
}

/// What the page does once the library is ready.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunOptions {
    #[serde(default)]
    pub bootstrap: Bootstrap,
    #[serde(default = "default_true")]
    pub display: bool,
    /// Refreshes every slot after display when set.
    #[serde(default)]
    pub refresh: Option<RefreshOptions>,
    /// Makes the ad tag return no slot for every define call.
    #[serde(default)]
    pub refuse_slots: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            display: true,
            refresh: None,
            refuse_slots: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Scenario {
    /// Parses a scenario from TOML, applies `BEBOP__` environment overrides
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// - [`SimError::Configuration`] if the TOML is malformed or does not
    ///   match the scenario layout
    /// - [`SimError::Validation`] if a field is out of range
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<SimError>> {
        let environment = Environment::default()
            .prefix("BEBOP")
            .separator("__")
            .try_parsing(true);
        Self::from_sources(toml_str, Some(environment))
    }

    /// Parses a scenario from TOML alone, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Same as [`Scenario::from_toml`].
    pub fn from_file_only(toml_str: &str) -> Result<Self, Report<SimError>> {
        Self::from_sources(toml_str, None)
    }

    fn from_sources(
        toml_str: &str,
        environment: Option<Environment>,
    ) -> Result<Self, Report<SimError>> {
        let mut builder = Config::builder().add_source(File::from_str(toml_str, FileFormat::Toml));
        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }
        let config = builder.build().change_context(SimError::Configuration {
            message: "Failed to build scenario configuration".to_string(),
        })?;

        let scenario: Self = config
            .try_deserialize()
            .change_context(SimError::Configuration {
                message: "Failed to deserialize scenario".to_string(),
            })?;

        scenario.validate().map_err(|e| {
            Report::new(SimError::Validation {
                message: e.to_string(),
            })
        })?;

        Ok(scenario)
    }

    /// The page configuration object handed to the library.
    #[must_use]
    pub fn page_config(&self) -> RawValue {
        let width = self.viewport_width;
        let mut viewport = RawObject::new();
        viewport.insert(
            "getViewPortWidth",
            RawValue::function(move || RawValue::Number(width)),
        );
        for category in &self.page.categories {
            viewport.insert(
                category.name.clone(),
                RawValue::from(Value::from(category.threshold)),
            );
        }

        let mut gpt = RawObject::new();
        gpt.insert("disableInitialLoad", self.page.disable_initial_load);
        gpt.insert("loadTag", self.page.load_tag);

        let mut page = RawObject::new();
        page.insert("viewPort", viewport);
        page.insert("gpt", gpt);

        if let Some(headertag) = &self.page.headertag {
            let api_ready = headertag.api_ready;
            let mut settings = RawObject::new();
            settings.insert("enabled", headertag.enabled);
            settings.insert(
                "reference",
                RawValue::function(move || {
                    let mut reference = RawObject::new();
                    reference.insert("apiReady", api_ready);
                    RawValue::Object(reference)
                }),
            );
            page.insert("headertag", settings);
        }

        RawValue::Object(page)
    }

    /// The array of slot configurations handed to `define_slots`.
    #[must_use]
    pub fn slot_configs(&self) -> RawValue {
        RawValue::from(
            self.slots
                .iter()
                .map(SlotScenario::to_config)
                .collect::<Vec<_>>(),
        )
    }

    #[must_use]
    pub fn page_targets(&self) -> RawValue {
        RawValue::from(Value::Object(self.page_targeting.clone()))
    }
}

impl SlotScenario {
    fn to_config(&self) -> RawValue {
        let view_port_sizes = if self.interstitial {
            RawValue::from(
                self.categories
                    .iter()
                    .map(|name| RawValue::from(name.as_str()))
                    .collect::<Vec<_>>(),
            )
        } else {
            let mut sizes = RawObject::new();
            for entry in &self.sizes {
                let list = entry
                    .sizes
                    .iter()
                    .map(|size| {
                        RawValue::from(size.iter().copied().map(RawValue::from).collect::<Vec<_>>())
                    })
                    .collect::<Vec<_>>();
                sizes.insert(entry.category.clone(), list);
            }
            RawValue::Object(sizes)
        };

        let mut config = RawObject::new();
        config.insert("gptDivId", self.div_id.as_str());
        config.insert("adUnitPath", self.ad_unit_path.as_str());
        config.insert("interstitial", self.interstitial);
        config.insert("lazyload", self.lazyload);
        config.insert("defineOnDisplay", self.define_on_display);
        config.insert("viewPortSizes", view_port_sizes);
        config.insert("targeting", Value::Object(self.targeting.clone()));
        RawValue::Object(config)
    }
}
