use std::fmt::Write;

use serde_json::Value;

use crate::form::{FieldDescriptor, Validator, WidgetKind};

/// Escape text for HTML element content and quoted attributes
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Text form of a stored value for an input's `value`
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Current values of a select, as the text their `<option>` would carry
fn selected_values(value: Option<&Value>) -> Vec<String> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(other) => scalar(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn attributes(name: &str, descriptor: &FieldDescriptor) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write!(out, " id=\"f-{0}\" name=\"{0}\"", escape(name))?;

    for (key, value) in &descriptor.extra_attrs {
        match key.as_str() {
            "multiple" if value == "true" => out.push_str(" multiple"),
            "multiple" => {}
            _ => write!(out, " {}=\"{}\"", escape(key), escape(value))?,
        }
    }
    if let Some(entity) = &descriptor.reference_entity {
        write!(out, " data-entity=\"{}\"", escape(entity))?;
    }

    for validator in &descriptor.validators {
        match validator {
            Validator::MaxLength(n) => write!(out, " maxlength=\"{}\"", n)?,
            Validator::MinLength(n) => write!(out, " minlength=\"{}\"", n)?,
            Validator::Ge(n) => write!(out, " min=\"{}\"", n)?,
            Validator::Le(n) => write!(out, " max=\"{}\"", n)?,
            Validator::Pattern(p) => write!(out, " pattern=\"{}\"", escape(p))?,
        }
    }
    if descriptor.required && descriptor.widget != WidgetKind::Checkbox {
        out.push_str(" required");
    }
    Ok(out)
}

/// Render the input element for one field with its current value
pub fn render_widget(
    name: &str,
    descriptor: &FieldDescriptor,
    value: Option<&Value>,
) -> Result<String, std::fmt::Error> {
    let attrs = attributes(name, descriptor)?;
    let mut out = String::new();

    match descriptor.widget {
        WidgetKind::TextInput => {
            let default_type = if descriptor.extra_attrs.contains_key("type") {
                ""
            } else {
                " type=\"text\""
            };
            write!(
                out,
                "<input class=\"form-control\"{}{} value=\"{}\">",
                default_type,
                attrs,
                escape(&value_text(value))
            )?;
        }
        WidgetKind::NumericInput => {
            write!(
                out,
                "<input class=\"form-control\" type=\"number\"{} value=\"{}\">",
                attrs,
                escape(&value_text(value))
            )?;
        }
        WidgetKind::Checkbox => {
            let checked = matches!(value, Some(Value::Bool(true)));
            write!(
                out,
                "<input class=\"form-check-input\" type=\"checkbox\" value=\"true\"{}{}>",
                attrs,
                if checked { " checked" } else { "" }
            )?;
        }
        WidgetKind::Select | WidgetKind::MultiSelect => {
            let selected = selected_values(value);
            write!(out, "<select class=\"form-select\"{}>", attrs)?;
            if descriptor.widget == WidgetKind::Select && !descriptor.required {
                out.push_str("<option value=\"\"></option>");
            }
            for (id, label) in &descriptor.options {
                let id = id.to_string();
                write!(
                    out,
                    "<option value=\"{}\"{}>{}</option>",
                    id,
                    if selected.contains(&id) { " selected" } else { "" },
                    escape(label)
                )?;
            }
            // plain collections have no option list, so their values are the options
            if descriptor.widget == WidgetKind::MultiSelect && descriptor.reference_entity.is_none() {
                for current in &selected {
                    if descriptor.options.keys().any(|id| id.to_string() == *current) {
                        continue;
                    }
                    let current = escape(current);
                    write!(out, "<option value=\"{0}\" selected>{0}</option>", current)?;
                }
            }
            out.push_str("</select>");
        }
        WidgetKind::Textarea => {
            write!(
                out,
                "<textarea class=\"form-control\"{}>{}</textarea>",
                attrs,
                escape(&value_text(value))
            )?;
        }
        WidgetKind::JsonBlob => {
            let text = match value {
                None | Some(Value::Null) => String::new(),
                Some(v) => serde_json::to_string_pretty(v).unwrap_or_default(),
            };
            write!(
                out,
                "<textarea class=\"form-control font-monospace\" rows=\"6\" data-json{}>{}</textarea>",
                attrs,
                escape(&text)
            )?;
        }
    }
    Ok(out)
}
