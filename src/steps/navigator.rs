use serde::Serialize;
use tracing::debug;

use crate::schema::field_model::FormValues;
use crate::steps::deriver::validate_step;
use crate::steps::step_model::MultiStepConfig;
use crate::validation::state::FormValidation;

/// What a navigation request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTransition {
    Moved { from: u32, to: u32 },
    /// Request accepted but nothing to do (first/last step, navigation off)
    Unchanged,
    /// Gate refused to advance; lists the required fields holding it back
    Blocked { fields: Vec<String> },
}

impl StepTransition {
    pub fn moved(&self) -> bool {
        matches!(self, StepTransition::Moved { .. })
    }
}

/// Data for the progress indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub current: u32,
    pub total: u32,
    pub titles: Vec<String>,
    pub percent: f32,
}

/// Current step of a multi-step form, always within `[1, step_count]`.
#[derive(Debug, Clone)]
pub struct StepNavigator {
    current: u32,
    step_count: u32,
    allow_step_navigation: bool,
    validate_on_step_change: bool,
}

impl StepNavigator {
    pub fn new(config: &MultiStepConfig) -> Self {
        Self {
            current: 1,
            step_count: config.step_count(),
            allow_step_navigation: config.allow_step_navigation,
            validate_on_step_change: config.validate_on_step_change,
        }
    }

    /// Start at a persisted position, clamped into range.
    pub fn restore(config: &MultiStepConfig, persisted: Option<u32>) -> Self {
        let mut nav = Self::new(config);
        if let Some(step) = persisted {
            nav.current = nav.clamp(step);
        }
        nav
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_last(&self) -> bool {
        self.current >= self.step_count
    }

    /// Advance one step. With gating on, the current step's fields are marked
    /// touched first and the step must pass the presence gate.
    pub fn next(
        &mut self,
        config: &MultiStepConfig,
        validation: &mut FormValidation,
        values: &FormValues,
    ) -> StepTransition {
        if self.validate_on_step_change {
            let fields = config.step_fields(self.current);
            for field in fields {
                validation.set_field_touched(&field.id);
            }

            if !validate_step(fields, values, validation.errors()) {
                let holding: Vec<String> = fields
                    .iter()
                    .filter(|f| !validate_step(std::slice::from_ref(*f), values, validation.errors()))
                    .map(|f| f.id.clone())
                    .collect();
                debug!(step = self.current, fields = ?holding, "step gate refused to advance");
                return StepTransition::Blocked { fields: holding };
            }
        }

        if self.is_last() {
            return StepTransition::Unchanged;
        }

        let from = self.current;
        self.current += 1;
        StepTransition::Moved {
            from,
            to: self.current,
        }
    }

    pub fn previous(&mut self) -> StepTransition {
        if self.is_first() || !self.allow_step_navigation {
            return StepTransition::Unchanged;
        }

        let from = self.current;
        self.current -= 1;
        StepTransition::Moved {
            from,
            to: self.current,
        }
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// Adopt a new config, keeping the position if it is still in range.
    pub fn reconfigure(&mut self, config: &MultiStepConfig) {
        self.step_count = config.step_count();
        self.allow_step_navigation = config.allow_step_navigation;
        self.validate_on_step_change = config.validate_on_step_change;
        self.current = self.clamp(self.current);
    }

    pub fn progress(&self, config: &MultiStepConfig) -> StepProgress {
        let percent = if self.step_count == 0 {
            0.0
        } else {
            self.current as f32 / self.step_count as f32 * 100.0
        };

        StepProgress {
            current: self.current,
            total: self.step_count,
            titles: config.steps.iter().map(|s| s.title.clone()).collect(),
            percent,
        }
    }

    fn clamp(&self, step: u32) -> u32 {
        step.clamp(1, self.step_count.max(1))
    }
}
