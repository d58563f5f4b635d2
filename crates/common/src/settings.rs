//! Page and slot settings.
//!
//! Settings are built from untrusted [`RawValue`] configuration. Building
//! never fails: every violation is recorded, and the accessors fail with
//! [`BebopError::InvalidState`] for as long as any error is recorded. The
//! `create_*` entry points report and reject invalid configuration up front.

use error_stack::Report;
use serde::Serialize;

use crate::ad_tag::AdSize;
use crate::error::{BebopError, BebopResult};
use crate::raw::{HostFunction, RawValue};
use crate::targeting::{map_from_raw, TargetingMap};
use crate::type_tag::{classify, is_int, mismatch_message, TypeTag};
use crate::validation::{
    dimension, optional_bool, required_string, size_list, type_mismatch, Validation,
};
use crate::viewport::{resolve_category, Category, ViewportCategories};

const GET_VIEWPORT_WIDTH: &str = "getViewPortWidth";

/// Whether a header bidding wrapper is present, and how to reach it.
#[derive(Debug, Clone)]
pub struct HeadertagSettings {
    enabled: bool,
    reference: Option<HostFunction>,
    validation: Validation,
}

impl HeadertagSettings {
    /// Builds headertag settings from the `headertag` page option.
    #[must_use]
    pub fn new(raw: &RawValue) -> Self {
        let mut validation = Validation::new();
        if !matches!(raw, RawValue::Undefined | RawValue::Object(_)) {
            validation.error(format!(
                "headertag Option: type: object, got: {}",
                classify(raw)
            ));
        }

        // A non-boolean `enabled` is an error, but its truthiness still
        // decides whether a reference is required.
        let enabled_raw = raw.get("enabled");
        let enabled = optional_bool(enabled_raw, "headertag.enabled", &mut validation)
            || enabled_raw.is_truthy();
        let reference = raw.get("reference").as_function().cloned();
        if enabled && reference.is_none() {
            validation.error("headertag.reference Option: type: function, default: none");
        }

        Self {
            enabled,
            reference,
            validation,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.validation.errors()
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid.
    pub fn enabled(&self) -> BebopResult<bool> {
        self.validation.check()?;
        Ok(self.enabled)
    }

    /// Calls the configured `reference` function and returns the headertag
    /// object it hands back.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid
    /// or no reference was configured.
    pub fn reference(&self) -> BebopResult<RawValue> {
        self.validation.check()?;
        self.reference.as_ref().map(HostFunction::call).ok_or_else(|| {
            Report::new(BebopError::InvalidState {
                message: "headertag.reference is not configured".to_string(),
            })
        })
    }
}

/// How the page sets up the ad tag.
#[derive(Debug, Clone)]
pub struct GptSettings {
    disable_initial_load: bool,
    load_tag: bool,
    validation: Validation,
}

impl GptSettings {
    /// Builds ad tag options from the `gpt` page option.
    #[must_use]
    pub fn new(raw: &RawValue) -> Self {
        let mut validation = Validation::new();
        if !matches!(raw, RawValue::Undefined | RawValue::Object(_)) {
            validation.error(format!("gpt Option: type: object, got: {}", classify(raw)));
        }

        Self {
            disable_initial_load: optional_bool(
                raw.get("disableInitialLoad"),
                "gpt.disableInitialLoad",
                &mut validation,
            ),
            load_tag: optional_bool(raw.get("loadTag"), "gpt.loadTag", &mut validation),
            validation,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.validation.errors()
    }

    /// True when the page calls `disableInitialLoad()` on the ad tag.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid.
    pub fn disable_initial_load(&self) -> BebopResult<bool> {
        self.validation.check()?;
        Ok(self.disable_initial_load)
    }

    /// True when the library is responsible for loading the ad tag.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid.
    pub fn load_tag(&self) -> BebopResult<bool> {
        self.validation.check()?;
        Ok(self.load_tag)
    }
}

/// Viewport categories and the width callback they are resolved against.
#[derive(Debug, Clone)]
pub struct ViewportSettings {
    categories: ViewportCategories,
    width: Option<HostFunction>,
    validation: Validation,
}

impl ViewportSettings {
    /// Builds viewport settings from the `viewPort` page option.
    ///
    /// Category entries are kept in declaration order. Unknown names and
    /// values that are not non-negative integers are dropped with a warning.
    #[must_use]
    pub fn new(raw: &RawValue) -> Self {
        let mut validation = Validation::new();
        let mut categories = ViewportCategories::new();

        let Some(object) = raw.as_object() else {
            validation.error("viewPort is required configuration");
            validation.error("viewPort: at least one size category is required");
            return Self {
                categories,
                width: None,
                validation,
            };
        };

        let width = object.get(GET_VIEWPORT_WIDTH).as_function().cloned();
        if width.is_none() {
            validation.error(format!(
                "viewPort.{GET_VIEWPORT_WIDTH} Option: type: function, required: true"
            ));
        }

        for (name, value) in object.iter().filter(|(k, _)| *k != GET_VIEWPORT_WIDTH) {
            let Ok(category) = name.parse::<Category>() else {
                validation.warn(format!("viewPort.{name}: unknown size category, ignored"));
                continue;
            };
            match value.as_f64().filter(|_| is_int(value)).and_then(dimension) {
                Some(threshold) => categories.insert(category, threshold),
                None => validation.warn(format!(
                    "viewPort.{name} Option: type: non-negative integer, got: {value} ({}), ignored",
                    classify(value)
                )),
            }
        }

        if categories.is_empty() {
            validation.error("viewPort: at least one size category is required");
        }

        Self {
            categories,
            width,
            validation,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.validation.errors()
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.validation.warnings()
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid.
    pub fn view_categories(&self) -> BebopResult<&ViewportCategories> {
        self.validation.check()?;
        Ok(&self.categories)
    }

    /// Current viewport width as reported by the page.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] when the settings are invalid,
    /// or [`BebopError::TypeMismatch`] when the callback does not return a
    /// number.
    pub fn viewport_width(&self) -> BebopResult<f64> {
        self.validation.check()?;
        let Some(width) = self.width.as_ref() else {
            return Err(Report::new(BebopError::invalid_state(&[format!(
                "viewPort.{GET_VIEWPORT_WIDTH} is not configured"
            )])));
        };
        let value = width.call();
        match value {
            RawValue::Number(n) if !n.is_nan() => Ok(n),
            other => Err(type_mismatch(mismatch_message(&other, &[TypeTag::Number]))),
        }
    }

    /// The category active at the current viewport width, if any.
    ///
    /// # Errors
    ///
    /// See [`ViewportSettings::viewport_width`].
    pub fn view_category(&self) -> BebopResult<Option<Category>> {
        let width = self.viewport_width()?;
        Ok(resolve_category(&self.categories, width))
    }
}

/// Validated page configuration, shared by every slot on the page.
#[derive(Debug, Clone)]
pub struct PageSettings {
    headertag: HeadertagSettings,
    gpt: GptSettings,
    viewport: ViewportSettings,
    validation: Validation,
}

impl PageSettings {
    /// Builds page settings. Never fails; see [`create_page_settings`].
    #[must_use]
    pub fn new(raw: &RawValue) -> Self {
        let headertag = HeadertagSettings::new(raw.get("headertag"));
        let gpt = GptSettings::new(raw.get("gpt"));
        let viewport = ViewportSettings::new(raw.get("viewPort"));

        let mut validation = Validation::new();
        if !matches!(raw, RawValue::Object(_)) {
            validation.error(format!(
                "page configuration: type: object, got: {}",
                classify(raw)
            ));
        }
        validation.extend(&headertag.validation);
        validation.extend(&gpt.validation);
        validation.extend(&viewport.validation);

        Self {
            headertag,
            gpt,
            viewport,
            validation,
        }
    }

    /// Every error found in the page configuration.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.validation.errors()
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.validation.warnings()
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every page error.
    pub fn check(&self) -> BebopResult<()> {
        self.validation.check()
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every page error.
    pub fn headertag(&self) -> BebopResult<&HeadertagSettings> {
        self.check()?;
        Ok(&self.headertag)
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every page error.
    pub fn gpt(&self) -> BebopResult<&GptSettings> {
        self.check()?;
        Ok(&self.gpt)
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every page error.
    pub fn viewport(&self) -> BebopResult<&ViewportSettings> {
        self.check()?;
        Ok(&self.viewport)
    }
}

/// Sizes a slot may render, per viewport category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSizes {
    /// Size lists per category, in declaration order.
    Standard(Vec<(Category, Vec<AdSize>)>),
    /// Categories an out-of-page slot is eligible in.
    Interstitial(Vec<Category>),
}

impl SlotSizes {
    /// Sizes configured for `category`. Empty for interstitial slots.
    #[must_use]
    pub fn sizes_for(&self, category: Category) -> &[AdSize] {
        match self {
            Self::Standard(map) => map
                .iter()
                .find(|(c, _)| *c == category)
                .map_or(&[], |(_, sizes)| sizes.as_slice()),
            Self::Interstitial(_) => &[],
        }
    }

    /// Categories the slot is configured for.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        match self {
            Self::Standard(map) => map.iter().map(|(c, _)| *c).collect(),
            Self::Interstitial(categories) => categories.clone(),
        }
    }
}

/// A slot configuration that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotDefinition {
    pub ad_unit_path: String,
    pub gpt_div_id: String,
    pub interstitial: bool,
    pub lazyload: bool,
    pub define_on_display: bool,
    pub sizes: SlotSizes,
    pub targeting: TargetingMap,
}

/// Slot configuration with everything that was found wrong with it.
#[derive(Debug, Clone)]
pub struct SlotSettings {
    definition: SlotDefinition,
    validation: Validation,
}

impl SlotSettings {
    /// Builds slot settings. Never fails; see [`create_slot_settings`].
    #[must_use]
    pub fn new(raw: &RawValue) -> Self {
        let mut validation = Validation::new();
        if !matches!(raw, RawValue::Object(_)) {
            validation.error(format!(
                "slot configuration: type: object, got: {}",
                classify(raw)
            ));
        }

        let gpt_div_id = match raw.get("gptDivId") {
            RawValue::String(id) if !id.is_empty() => id.clone(),
            other => {
                validation.error(format!(
                    "gptDivId Option: type: non-empty string, required: true, got: {}",
                    classify(other)
                ));
                String::new()
            }
        };

        let ad_unit_path = required_string(raw.get("adUnitPath"), "adUnitPath", &mut validation);

        let interstitial = optional_bool(raw.get("interstitial"), "interstitial", &mut validation);
        let lazyload = optional_bool(raw.get("lazyload"), "lazyload", &mut validation);
        let define_on_display =
            optional_bool(raw.get("defineOnDisplay"), "defineOnDisplay", &mut validation);

        let sizes = if interstitial {
            SlotSizes::Interstitial(interstitial_categories(raw.get("viewPortSizes"), &mut validation))
        } else {
            SlotSizes::Standard(standard_sizes(raw.get("viewPortSizes"), &mut validation))
        };
        if sizes.categories().is_empty() {
            validation.error("viewPortSizes: at least one recognized size category is required");
        }

        let targeting = map_from_raw(raw.get("targeting"), validation.errors_mut());

        Self {
            definition: SlotDefinition {
                ad_unit_path,
                gpt_div_id,
                interstitial,
                lazyload,
                define_on_display,
                sizes,
                targeting,
            },
            validation,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.validation.errors()
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.validation.warnings()
    }

    /// Returns the plain definition once the configuration is known good.
    ///
    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every slot error.
    pub fn validate(&self) -> BebopResult<SlotDefinition> {
        self.validation.check()?;
        Ok(self.definition.clone())
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every slot error.
    pub fn gpt_div_id(&self) -> BebopResult<&str> {
        self.validation.check()?;
        Ok(&self.definition.gpt_div_id)
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every slot error.
    pub fn ad_unit_path(&self) -> BebopResult<&str> {
        self.validation.check()?;
        Ok(&self.definition.ad_unit_path)
    }

    /// # Errors
    ///
    /// Fails with [`BebopError::InvalidState`] carrying every slot error.
    pub fn targeting(&self) -> BebopResult<&TargetingMap> {
        self.validation.check()?;
        Ok(&self.definition.targeting)
    }
}

fn interstitial_categories(raw: &RawValue, validation: &mut Validation) -> Vec<Category> {
    let Some(names) = raw.as_array() else {
        validation.error(format!(
            "viewPortSizes Option: type: array of category names for interstitial slots, got: {}",
            classify(raw)
        ));
        return Vec::new();
    };

    let mut categories = Vec::new();
    for name in names {
        match name.as_str().map(str::parse::<Category>) {
            Some(Ok(category)) if !categories.contains(&category) => categories.push(category),
            Some(Ok(_)) => {}
            Some(Err(())) => {
                validation.warn(format!("viewPortSizes: unknown size category {name}, ignored"));
            }
            None => validation.error(format!(
                "viewPortSizes entry: type: string, got: {}",
                classify(name)
            )),
        }
    }
    categories
}

fn standard_sizes(raw: &RawValue, validation: &mut Validation) -> Vec<(Category, Vec<AdSize>)> {
    let Some(object) = raw.as_object() else {
        validation.error(format!(
            "viewPortSizes Option: type: object of category to sizes, got: {}",
            classify(raw)
        ));
        return Vec::new();
    };

    let mut sizes = Vec::new();
    for (name, value) in object.iter() {
        let Ok(category) = name.parse::<Category>() else {
            validation.warn(format!("viewPortSizes.{name}: unknown size category, ignored"));
            continue;
        };
        match size_list(value) {
            Some(list) => sizes.push((category, list)),
            None => validation.error(format!(
                "viewPortSizes.{name} Option: type: array of [width, height] integer pairs, got: {value}"
            )),
        }
    }
    sizes
}

/// Builds page settings, logging warnings and errors.
///
/// # Errors
///
/// Fails with [`BebopError::InvalidState`] carrying every page error.
pub fn create_page_settings(raw: &RawValue) -> BebopResult<PageSettings> {
    let settings = PageSettings::new(raw);
    settings.validation.report("page configuration")?;
    Ok(settings)
}

/// Builds slot settings, logging warnings and errors.
///
/// # Errors
///
/// Fails with [`BebopError::InvalidState`] carrying every slot error.
pub fn create_slot_settings(raw: &RawValue) -> BebopResult<SlotSettings> {
    let settings = SlotSettings::new(raw);
    settings.validation.report("slot configuration")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targeting::TargetingValue;
    use crate::test_support::tests::{page_config, raw, slot_config};
    use serde_json::json;

    fn invalid_state_message(result: BebopResult<impl std::fmt::Debug>) -> String {
        let report = result.expect_err("should fail with invalid state");
        match report.current_context() {
            BebopError::InvalidState { message } => message.clone(),
            other => panic!("Expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn headertag_defaults_to_disabled() {
        let settings = HeadertagSettings::new(&RawValue::Undefined);
        assert!(settings.errors().is_empty());
        assert_eq!(settings.enabled().ok(), Some(false));
        assert!(
            settings.reference().is_err(),
            "should fail when no reference was configured"
        );
    }

    #[test]
    fn headertag_requires_reference_when_enabled() {
        let settings = HeadertagSettings::new(&raw(json!({"enabled": true})));
        assert_eq!(settings.errors().len(), 1);
        assert!(settings.errors()[0].starts_with("headertag.reference"));
        assert!(settings.enabled().is_err());
    }

    #[test]
    fn headertag_reference_is_called() {
        let mut config = raw(json!({"enabled": true}));
        config.set(
            "reference",
            RawValue::function(|| raw(json!({"apiReady": true}))),
        );
        let settings = HeadertagSettings::new(&config);

        let reference = settings.reference().expect("should call the reference");
        assert!(reference.get("apiReady").is_truthy());
    }

    #[test]
    fn headertag_rejects_non_boolean_enabled() {
        let settings = HeadertagSettings::new(&raw(json!({"enabled": "yes"})));
        assert!(settings.errors()[0].starts_with("headertag.enabled"));
    }

    #[test]
    fn truthy_non_boolean_enabled_still_requires_reference() {
        let settings = HeadertagSettings::new(&raw(json!({"enabled": "yes"})));
        assert_eq!(settings.errors().len(), 2, "should report type and reference errors");
        assert!(settings.errors()[1].contains("reference"));

        let settings = HeadertagSettings::new(&raw(json!({"enabled": 0})));
        assert_eq!(settings.errors().len(), 1, "should only report the type error");
    }

    #[test]
    fn gpt_options_default_false_and_reject_wrong_types() {
        let settings = GptSettings::new(&RawValue::Undefined);
        assert_eq!(settings.disable_initial_load().ok(), Some(false));
        assert_eq!(settings.load_tag().ok(), Some(false));

        let settings = GptSettings::new(&raw(json!({"disableInitialLoad": true, "loadTag": true})));
        assert_eq!(settings.disable_initial_load().ok(), Some(true));
        assert_eq!(settings.load_tag().ok(), Some(true));

        let settings = GptSettings::new(&raw(json!({"disableInitialLoad": 1, "loadTag": "no"})));
        assert_eq!(settings.errors().len(), 2, "should not coerce wrong types");
        assert!(settings.load_tag().is_err());
    }

    #[test]
    fn viewport_keeps_declaration_order_and_drops_malformed_entries() {
        let config = page_config(
            500.0,
            json!({"small": 400, "gigantic": 2000, "large": 800, "medium": 1.5, "tiny": -1}),
        );
        let settings = ViewportSettings::new(config.get("viewPort"));

        assert!(settings.errors().is_empty());
        assert_eq!(settings.warnings().len(), 3, "should warn for each dropped entry");
        let categories = settings.view_categories().expect("should be valid");
        assert_eq!(
            categories.iter().collect::<Vec<_>>(),
            vec![(Category::Small, 400), (Category::Large, 800)]
        );
    }

    #[test]
    fn viewport_accepts_integral_floats() {
        let settings =
            ViewportSettings::new(page_config(500.0, json!({"large": 768.0})).get("viewPort"));
        assert_eq!(
            settings.view_categories().ok().and_then(|c| c.threshold(Category::Large)),
            Some(768)
        );
    }

    #[test]
    fn viewport_with_only_malformed_categories_is_invalid() {
        let settings = ViewportSettings::new(
            page_config(500.0, json!({"large": "800", "medium": 1.5, "small": null})).get("viewPort"),
        );

        assert_eq!(settings.errors().len(), 1);
        let message = invalid_state_message(settings.view_categories());
        assert!(message.contains("at least one size category"));
        assert!(settings.view_category().is_err());
        assert!(settings.viewport_width().is_err());
    }

    #[test]
    fn viewport_requires_width_function_and_object() {
        let settings = ViewportSettings::new(&raw(json!({"large": 800})));
        assert!(settings.errors()[0].contains("getViewPortWidth"));

        let settings = ViewportSettings::new(&RawValue::Undefined);
        assert_eq!(settings.errors().len(), 2);
    }

    #[test]
    fn viewport_width_must_be_a_number() {
        let mut config = raw(json!({"large": 800}));
        config.set(GET_VIEWPORT_WIDTH, RawValue::function(|| RawValue::from("wide")));
        let settings = ViewportSettings::new(&config);

        let report = settings.viewport_width().expect_err("should reject strings");
        assert!(matches!(
            report.current_context(),
            BebopError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn view_category_resolves_against_current_width() {
        let config = page_config(500.0, json!({"large": 500, "medium": 0}));
        let settings = ViewportSettings::new(config.get("viewPort"));
        assert_eq!(settings.view_category().ok(), Some(Some(Category::Large)));
    }

    #[test]
    fn page_settings_aggregate_errors_from_every_part() {
        let settings = PageSettings::new(&raw(json!({
            "headertag": {"enabled": 3},
            "gpt": {"loadTag": "yes"},
        })));

        assert_eq!(
            settings.errors().len(),
            4,
            "should collect headertag, gpt and both viewport errors"
        );
        let message = invalid_state_message(settings.viewport());
        assert_eq!(message.lines().count(), 4, "should join every error");
    }

    #[test]
    fn create_page_settings_rejects_invalid_configuration() {
        assert!(create_page_settings(&raw(json!({}))).is_err());
        let settings = create_page_settings(&page_config(1024.0, json!({"large": 800})))
            .expect("should accept a valid page");
        assert!(settings.gpt().is_ok());
    }

    #[test]
    fn slot_settings_validate_into_definition() {
        let settings = SlotSettings::new(&slot_config(json!({
            "targeting": {"pos": "top", "kw": ["a", 1]},
        })));

        let definition = settings.validate().expect("should be valid");
        assert_eq!(definition.gpt_div_id, "d1");
        assert_eq!(definition.ad_unit_path, "/1/x");
        assert!(!definition.interstitial);
        assert_eq!(
            definition.sizes.sizes_for(Category::Large),
            [AdSize::new(300, 250)]
        );
        assert_eq!(
            definition.targeting.get("pos"),
            Some(&TargetingValue::from("top"))
        );
    }

    #[test]
    fn slot_settings_collect_every_error() {
        let settings = SlotSettings::new(&raw(json!({
            "gptDivId": "",
            "adUnitPath": 1,
            "lazyload": "yes",
            "viewPortSizes": {"large": [[300]]},
            "targeting": {"bad": true},
        })));

        assert_eq!(settings.errors().len(), 6);
        let message = invalid_state_message(settings.validate());
        assert_eq!(message.lines().count(), 6);
        assert!(settings.gpt_div_id().is_err());
    }

    #[test]
    fn slot_settings_drop_unknown_categories_with_warning() {
        let settings = SlotSettings::new(&slot_config(json!({
            "viewPortSizes": {"gigantic": [[970, 250]], "large": [[728, 90]]},
        })));

        assert!(settings.errors().is_empty());
        assert_eq!(settings.warnings().len(), 1);
        let definition = settings.validate().expect("should be valid");
        assert_eq!(definition.sizes.categories(), vec![Category::Large]);
    }

    #[test]
    fn slot_with_only_unknown_categories_is_invalid() {
        let settings = SlotSettings::new(&slot_config(json!({
            "viewPortSizes": {"gigantic": [[970, 250]]},
        })));
        assert_eq!(settings.errors().len(), 1);
    }

    #[test]
    fn interstitial_slots_take_category_lists() {
        let settings = SlotSettings::new(&slot_config(json!({
            "interstitial": true,
            "viewPortSizes": ["large", "gigantic", "large", "small"],
        })));

        assert!(settings.errors().is_empty());
        assert_eq!(settings.warnings().len(), 1);
        let definition = settings.validate().expect("should be valid");
        assert_eq!(
            definition.sizes,
            SlotSizes::Interstitial(vec![Category::Large, Category::Small])
        );
        assert!(definition.sizes.sizes_for(Category::Large).is_empty());
    }

    #[test]
    fn viewport_sizes_shape_must_match_interstitial_flag() {
        let settings = SlotSettings::new(&slot_config(json!({
            "interstitial": true,
            "viewPortSizes": {"large": [[300, 250]]},
        })));
        assert!(settings.errors()[0].contains("interstitial"));

        let settings = SlotSettings::new(&slot_config(json!({
            "viewPortSizes": ["large"],
        })));
        assert!(settings.errors()[0].starts_with("viewPortSizes Option"));
    }

    #[test]
    fn empty_size_lists_are_allowed() {
        let settings = SlotSettings::new(&slot_config(json!({
            "viewPortSizes": {"large": [[728, 90]], "small": []},
        })));
        let definition = settings.validate().expect("should be valid");
        assert!(definition.sizes.sizes_for(Category::Small).is_empty());
        assert_eq!(definition.sizes.categories().len(), 2);
    }

    #[test]
    fn create_slot_settings_fails_with_joined_errors() {
        let message = invalid_state_message(create_slot_settings(&raw(json!({}))));
        assert!(message.contains("gptDivId"));
        assert!(message.contains("adUnitPath"));
        assert!(message.contains("viewPortSizes"));
    }
}
