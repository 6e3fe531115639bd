//! Enabled/disabled state of the survey form controls.

use std::collections::BTreeMap;

/// Control that dismisses the error dialog. It is never disabled.
pub const CLOSE_ERROR_CONTROL: &str = "closeErrorModal";

/// Controls of the survey form, by element id.
pub const SURVEY_CONTROLS: &[&str] = &[
    "role_student",
    "role_employee",
    "student_number",
    "dtu_username",
    "satisfaction",
    "course_number",
    "workshop_yes",
    "workshop_no",
    "submitButton",
    CLOSE_ERROR_CONTROL,
];

/// Enabled flags for a set of controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControls {
    enabled: BTreeMap<String, bool>,
}

impl FormControls {
    /// The survey form with every control enabled.
    pub fn survey() -> Self {
        Self::with_controls(SURVEY_CONTROLS.iter().copied())
    }

    /// A form over the given control ids, all enabled.
    pub fn with_controls<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            enabled: ids.into_iter().map(|id| (id.to_string(), true)).collect(),
        }
    }

    /// Whether `id` is enabled. Unknown ids read as disabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.get(id).copied().unwrap_or(false)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(flag) = self.enabled.get_mut(id) {
            *flag = enabled;
        }
    }

    /// Disable every control except `keep`.
    pub fn disable_all_except(&mut self, keep: &str) {
        for (id, flag) in &mut self.enabled {
            *flag = id == keep;
        }
    }

    pub fn all_enabled(&self) -> bool {
        self.enabled.values().all(|&e| e)
    }

    /// Ids of controls currently enabled.
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.enabled
            .iter()
            .filter(|&(_, &e)| e)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl Default for FormControls {
    fn default() -> Self {
        Self::survey()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_starts_enabled() {
        let form = FormControls::survey();
        assert!(form.all_enabled());
        assert!(form.is_enabled("submitButton"));
        assert!(!form.is_enabled("nope"));
    }

    #[test]
    fn disable_all_except_keeps_one() {
        let mut form = FormControls::survey();
        form.disable_all_except(CLOSE_ERROR_CONTROL);
        assert_eq!(form.enabled_ids(), vec![CLOSE_ERROR_CONTROL]);
    }
}
