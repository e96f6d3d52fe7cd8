//! Form binding and validation.
//!
//! A [`Form`] is built from a static list of [`FieldDef`]s. It can be filled
//! from an API record ([`Form::populate`]) or from a browser submission
//! ([`Form::bind`] + [`Form::validate`]), and turned back into an API payload
//! through an explicit form-field to API-field map ([`Form::payload`]).

pub mod field;
pub mod rules;

use serde::Serialize;
use serde_json::Value;

pub use field::{Choice, FieldDef, FieldKind, FieldValue, Initial};
pub use rules::Rule;

use crate::net::Record;
use rules::Flow;

/// `(form field, API field)` pairs.
pub type FieldMap = &'static [(&'static str, &'static str)];

pub const INVALID_CHOICE: &str = "Not a valid choice.";

/// Raw `application/x-www-form-urlencoded` pairs, in submission order.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pairs: Vec<(String, String)>,
}

impl Submission {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `name`.
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl From<Vec<(String, String)>> for Submission {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub def: &'static FieldDef,
    pub value: FieldValue,
    pub errors: Vec<String>,
    pub choices: Vec<Choice>,
    raw: Option<Vec<String>>,
}

impl Field {
    fn new(def: &'static FieldDef) -> Self {
        Self {
            def,
            value: FieldValue::from_default(def.kind, def.default),
            errors: Vec::new(),
            choices: Vec::new(),
            raw: None,
        }
    }

    fn first_raw(&self) -> &str {
        self.raw
            .as_ref()
            .and_then(|r| r.first())
            .map_or("", String::as_str)
    }

    fn validate(&mut self) {
        self.errors.clear();
        let Some(raw) = self.raw.clone() else {
            return;
        };

        match self.def.kind {
            FieldKind::Checkbox => {}
            FieldKind::MultiSelect => {
                let picked: Vec<&str> = raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                let (errors, flow) = rules::run(self.def.rules, &picked.join(","));
                self.errors = errors;
                if flow == Flow::Stop {
                    self.value = FieldValue::Ids(Vec::new());
                    return;
                }
                let mut ids = Vec::with_capacity(picked.len());
                for entry in picked {
                    match entry.parse::<i64>() {
                        Ok(id) if self.choices.iter().any(|c| c.id == id) => {
                            if !ids.contains(&id) {
                                ids.push(id);
                            }
                        }
                        _ => {
                            if !self.errors.iter().any(|e| e == INVALID_CHOICE) {
                                self.errors.push(INVALID_CHOICE.to_string());
                            }
                        }
                    }
                }
                self.value = FieldValue::Ids(ids);
            }
            kind => {
                let input = raw.first().map_or("", String::as_str);
                let (errors, flow) = rules::run(self.def.rules, input);
                self.errors = errors;
                if flow == Flow::Stop {
                    // Blank text stays a string; blank numbers and choices are null.
                    self.value = match kind {
                        FieldKind::Text | FieldKind::Password => FieldValue::Text(input.to_string()),
                        _ => FieldValue::Empty,
                    };
                    return;
                }
                self.value = match kind {
                    FieldKind::Text | FieldKind::Password => FieldValue::Text(input.to_string()),
                    FieldKind::Hidden | FieldKind::Integer => match input.trim().parse::<i64>() {
                        Ok(n) => FieldValue::Int(n),
                        Err(_) => {
                            if !self.errors.iter().any(|e| e == rules::INVALID_INTEGER) {
                                self.errors.push(rules::INVALID_INTEGER.to_string());
                            }
                            FieldValue::Empty
                        }
                    },
                    FieldKind::Select => match input.trim().parse::<i64>() {
                        Ok(id) if self.choices.iter().any(|c| c.id == id) => FieldValue::Int(id),
                        _ => {
                            self.errors.push(INVALID_CHOICE.to_string());
                            FieldValue::Empty
                        }
                    },
                    FieldKind::Checkbox | FieldKind::MultiSelect => return,
                };
            }
        }
    }

    fn view(&self) -> FieldView {
        let value = match (&self.raw, self.def.kind) {
            (_, FieldKind::Password) => String::new(),
            (Some(_), FieldKind::Text | FieldKind::Integer | FieldKind::Hidden) => self.first_raw().to_string(),
            _ => self.value.display(),
        };
        let options = self
            .choices
            .iter()
            .map(|c| OptionView {
                value: c.id,
                label: c.label.clone(),
                selected: self.is_selected(c.id),
            })
            .collect();
        FieldView {
            name: self.def.name,
            label: self.def.label,
            kind: self.def.kind,
            value,
            checked: matches!(self.value, FieldValue::Bool(true)),
            required: self.def.rules.iter().any(|r| matches!(r, Rule::Required(_))),
            description: self.def.description,
            errors: self.errors.clone(),
            options,
        }
    }

    fn is_selected(&self, id: i64) -> bool {
        match &self.raw {
            Some(raw) if !self.errors.is_empty() => raw.iter().any(|r| r.trim() == id.to_string()),
            _ => self.value.contains(id),
        }
    }
}

/// A form instance: definitions plus bound values, errors and choices.
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<Field>,
}

impl Form {
    pub fn new(defs: &'static [FieldDef]) -> Self {
        Self {
            fields: defs.iter().map(Field::new).collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.def.name == name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.def.name == name)
    }

    pub fn set_choices(&mut self, name: &str, choices: Vec<Choice>) {
        if let Some(field) = self.field_mut(name) {
            field.choices = choices;
        }
    }

    pub fn set_value(&mut self, name: &str, value: FieldValue) {
        if let Some(field) = self.field_mut(name) {
            field.value = value;
        }
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.field(name).map(|f| &f.value)
    }

    /// Value of the hidden `id` field, if any.
    pub fn id(&self) -> Option<i64> {
        self.value("id").and_then(FieldValue::as_int)
    }

    pub fn ids(&self, name: &str) -> &[i64] {
        self.value(name).map_or(&[][..], FieldValue::as_ids)
    }

    /// Take raw input from a submission. Checkboxes absent from the
    /// submission are unchecked.
    pub fn bind(&mut self, submission: &Submission) {
        for field in &mut self.fields {
            let values: Vec<String> = submission
                .all(field.def.name)
                .into_iter()
                .map(str::to_string)
                .collect();
            if field.def.kind == FieldKind::Checkbox {
                let checked = values.iter().any(|v| !matches!(v.trim(), "" | "false"));
                field.value = FieldValue::Bool(checked);
            }
            field.raw = Some(values);
        }
    }

    /// Validate every bound field. Returns `true` when no field has errors.
    pub fn validate(&mut self) -> bool {
        for field in &mut self.fields {
            field.validate();
        }
        self.is_valid()
    }

    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| f.errors.is_empty())
    }

    /// Copy mapped API fields (and the record id) onto the form.
    pub fn populate(&mut self, record: &Record, map: FieldMap) {
        if let Some(id) = record.get("id") {
            self.set_value("id", FieldValue::from_json(FieldKind::Hidden, id));
        }
        for (form_field, api_field) in map {
            let Some(field) = self.field_mut(form_field) else {
                continue;
            };
            let value = record.get(*api_field).unwrap_or(&Value::Null);
            field.value = FieldValue::from_json(field.def.kind, value);
        }
    }

    /// Build the API payload for the mapped fields.
    pub fn payload(&self, map: FieldMap) -> Record {
        let mut payload = Record::new();
        for (form_field, api_field) in map {
            if let Some(field) = self.field(form_field) {
                payload.insert((*api_field).to_string(), field.value.to_json());
            }
        }
        payload
    }

    pub fn views(&self) -> Vec<FieldView> {
        self.fields.iter().map(Field::view).collect()
    }

    /// What a browser sends back for the rendered form, left untouched.
    #[cfg(test)]
    pub(crate) fn resubmission(&self) -> Submission {
        let mut pairs = Vec::new();
        for view in self.views() {
            match view.kind {
                FieldKind::Checkbox => {
                    if view.checked {
                        pairs.push((view.name.to_string(), "y".to_string()));
                    }
                }
                FieldKind::Select | FieldKind::MultiSelect => {
                    let picked: Vec<_> = view.options.iter().filter(|o| o.selected).collect();
                    if picked.is_empty() && view.kind == FieldKind::Select {
                        pairs.push((view.name.to_string(), String::new()));
                    }
                    for o in picked {
                        pairs.push((view.name.to_string(), o.value.to_string()));
                    }
                }
                _ => pairs.push((view.name.to_string(), view.value.clone())),
            }
        }
        Submission::new(pairs)
    }
}

/// Template-facing view of one field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub description: Option<&'static str>,
    pub errors: Vec<String>,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub value: i64,
    pub label: String,
    pub selected: bool,
}
