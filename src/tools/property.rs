use serde_json::{Map, Value};

use crate::error::PropertyError;

/// Persisted property values of one tool, keyed by property name
pub type ToolState = Map<String, Value>;

/// The kind and current value of a tool property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Slider {
        min: f32,
        max: f32,
        step: f32,
        unit: &'static str,
        value: f32,
    },
    Checkbox {
        value: bool,
    },
    Radio {
        options: Vec<&'static str>,
        selected: usize,
    },
    /// Stateless; pressing it sends `event` to the tool
    Button {
        event: &'static str,
    },
}

impl PropertyKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Slider { .. } => "slider",
            Self::Checkbox { .. } => "checkbox",
            Self::Radio { .. } => "radio",
            Self::Button { .. } => "button",
        }
    }
}

/// A user-adjustable setting exposed by a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolProperty {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: PropertyKind,
}

impl ToolProperty {
    pub fn slider(name: &'static str, label: &'static str, min: f32, max: f32, step: f32, unit: &'static str, value: f32) -> Self {
        Self {
            name,
            label,
            kind: PropertyKind::Slider {
                min,
                max,
                step,
                unit,
                value: value.clamp(min, max),
            },
        }
    }

    pub fn checkbox(name: &'static str, label: &'static str, value: bool) -> Self {
        Self {
            name,
            label,
            kind: PropertyKind::Checkbox { value },
        }
    }

    pub fn radio(name: &'static str, label: &'static str, options: &[&'static str], selected: usize) -> Self {
        Self {
            name,
            label,
            kind: PropertyKind::Radio {
                options: options.to_vec(),
                selected: selected.min(options.len().saturating_sub(1)),
            },
        }
    }

    pub fn button(name: &'static str, label: &'static str, event: &'static str) -> Self {
        Self {
            name,
            label,
            kind: PropertyKind::Button { event },
        }
    }

    fn mismatch(&self, expected: &'static str) -> PropertyError {
        PropertyError::TypeMismatch {
            name: self.name.to_string(),
            expected,
            found: self.kind.type_name(),
        }
    }
}

/// Ordered set of properties with unique names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolProperties {
    entries: Vec<ToolProperty>,
}

impl ToolProperties {
    pub fn new(entries: Vec<ToolProperty>) -> Result<Self, PropertyError> {
        let mut properties = Self::default();
        for property in entries {
            properties.register(property)?;
        }
        Ok(properties)
    }

    /// Adds a property. Names must be unique within a tool.
    pub fn register(&mut self, property: ToolProperty) -> Result<(), PropertyError> {
        if self.get(property.name).is_some() {
            return Err(PropertyError::DuplicateName(property.name.to_string()));
        }
        self.entries.push(property);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolProperty> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ToolProperty> {
        self.entries.iter().find(|p| p.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut ToolProperty, PropertyError> {
        self.entries
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PropertyError::Unknown(name.to_string()))
    }

    pub fn slider(&self, name: &str) -> Option<f32> {
        match self.get(name)?.kind {
            PropertyKind::Slider { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn checkbox(&self, name: &str) -> Option<bool> {
        match self.get(name)?.kind {
            PropertyKind::Checkbox { value } => Some(value),
            _ => None,
        }
    }

    pub fn radio(&self, name: &str) -> Option<&'static str> {
        match &self.get(name)?.kind {
            PropertyKind::Radio { options, selected } => options.get(*selected).copied(),
            _ => None,
        }
    }

    /// Sets a slider, clamping to its range and snapping to its step.
    pub fn set_slider(&mut self, name: &str, new_value: f32) -> Result<f32, PropertyError> {
        let property = self.get_mut(name)?;
        match &mut property.kind {
            PropertyKind::Slider { min, max, step, value, .. } => {
                let snapped = if *step > 0.0 {
                    *min + ((new_value - *min) / *step).round() * *step
                } else {
                    new_value
                };
                *value = snapped.clamp(*min, *max);
                Ok(*value)
            }
            _ => Err(property.mismatch("slider")),
        }
    }

    pub fn set_checkbox(&mut self, name: &str, new_value: bool) -> Result<(), PropertyError> {
        let property = self.get_mut(name)?;
        match &mut property.kind {
            PropertyKind::Checkbox { value } => {
                *value = new_value;
                Ok(())
            }
            _ => Err(property.mismatch("checkbox")),
        }
    }

    pub fn set_radio(&mut self, name: &str, option: &str) -> Result<(), PropertyError> {
        let property = self.get_mut(name)?;
        match &mut property.kind {
            PropertyKind::Radio { options, selected } => match options.iter().position(|o| *o == option) {
                Some(index) => {
                    *selected = index;
                    Ok(())
                }
                None => Err(PropertyError::Unknown(format!("{}={}", name, option))),
            },
            _ => Err(property.mismatch("radio")),
        }
    }

    /// Event name of a button property
    pub fn button_event(&self, name: &str) -> Result<&'static str, PropertyError> {
        let property = self.get(name).ok_or_else(|| PropertyError::Unknown(name.to_string()))?;
        match property.kind {
            PropertyKind::Button { event } => Ok(event),
            _ => Err(property.mismatch("button")),
        }
    }

    /// Current values of every stateful property. Buttons are left out.
    pub fn to_state(&self) -> ToolState {
        let mut state = ToolState::new();
        for property in &self.entries {
            let value = match &property.kind {
                PropertyKind::Slider { value, .. } => Value::from(*value as f64),
                PropertyKind::Checkbox { value } => Value::Bool(*value),
                PropertyKind::Radio { options, selected } => Value::from(options[*selected]),
                PropertyKind::Button { .. } => continue,
            };
            state.insert(property.name.to_string(), value);
        }
        state
    }

    /// Restores values saved by [`ToolProperties::to_state`].
    ///
    /// Names the tool no longer has are skipped.
    pub fn apply_state(&mut self, state: &ToolState) -> Result<(), PropertyError> {
        for (name, value) in state {
            let Some(property) = self.get(name) else {
                log::warn!("Ignoring saved value for unknown tool property {:?}", name);
                continue;
            };
            let expected = property.kind.type_name();
            match (expected, value) {
                ("slider", Value::Number(n)) => {
                    self.set_slider(name, n.as_f64().unwrap_or_default() as f32)?;
                }
                ("checkbox", Value::Bool(b)) => self.set_checkbox(name, *b)?,
                ("radio", Value::String(s)) => self.set_radio(name, s)?,
                _ => {
                    return Err(PropertyError::TypeMismatch {
                        name: name.clone(),
                        expected,
                        found: json_type_name(value),
                    });
                }
            }
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
