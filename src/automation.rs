//! Sample-accurate parameter automation.
//!
//! A [`ParamTimeline`] holds time-stamped events the same way an audio graph parameter does:
//! a value can be set at an instant, or ramped linearly / exponentially so that it arrives at
//! a target exactly at the event time. Ramps start from the time and value of the event that
//! precedes them. Events are kept ordered by time; events sharing a timestamp keep their
//! insertion order.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ramp {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamEvent {
    pub time: f64,
    pub value: f32,
    pub ramp: Ramp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTimeline {
    default_value: f32,
    events: Vec<ParamEvent>,
}

impl ParamTimeline {
    pub fn new(default_value: f32) -> Self {
        ParamTimeline { default_value, events: Vec::new() }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(ParamEvent { time, value, ramp: Ramp::Set })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(ParamEvent { time, value, ramp: Ramp::Linear })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(ParamEvent { time, value, ramp: Ramp::Exponential })
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    fn insert(&mut self, event: ParamEvent) -> &mut Self {
        let idx = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(idx, event);
        self
    }

    /// Value of the parameter at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let next = self.events.partition_point(|e| e.time <= t);

        let (prev_time, prev_value) = match next.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => match self.events.first() {
                // Before the first event the ramp (if any) has not begun
                Some(first) => (first.time, self.default_value),
                None => return self.default_value,
            },
        };

        let Some(target) = self.events.get(next) else {
            return prev_value;
        };

        let span = target.time - prev_time;
        if t < prev_time || span <= 0.0 {
            return prev_value;
        }
        let progress = ((t - prev_time) / span) as f32;

        match target.ramp {
            Ramp::Set => prev_value,
            Ramp::Linear => prev_value + (target.value - prev_value) * progress,
            Ramp::Exponential => {
                // Undefined across zero or a sign change; hold instead
                if prev_value == 0.0 || target.value == 0.0 || (prev_value < 0.0) != (target.value < 0.0) {
                    prev_value
                } else {
                    prev_value * (target.value / prev_value).powf(progress)
                }
            }
        }
    }
}
