//! nmcli terse text protocol
//!
//! Decoding: `nmcli -t` prints one `key:value` pair per line and escapes
//! colons inside values as `\:`. [`NmCliOutput`] keeps the whole block as a
//! flat map and hands out per-prefix [`NmCliSection`] views.
//!
//! Encoding: settings are written as `prefix.key "value" ` fragments that are
//! concatenated into a single `nmcli connection add/modify` command line.

use std::collections::BTreeMap;

/// Parsed `nmcli -t ... show` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NmCliOutput {
    values: BTreeMap<String, String>,
}

impl NmCliOutput {
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = match split_key_value(line) {
                Some(pair) => pair,
                None => continue,
            };
            values.insert(key.trim().to_string(), unescape(value));
        }
        Self { values }
    }

    /// Keys below `prefix.`, matched case sensitively (`ipv4` vs `IP4`)
    pub fn section<'a>(&'a self, prefix: &'a str) -> NmCliSection<'a> {
        NmCliSection { output: self, prefix }
    }

    pub fn has_section(&self, prefix: &str) -> bool {
        let dotted = format!("{}.", prefix);
        self.values.keys().any(|k| k.starts_with(&dotted))
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// View over the keys of one setting (`ipv4`, `802-11-wireless`, `IP4`, ...)
#[derive(Debug, Clone, Copy)]
pub struct NmCliSection<'a> {
    output: &'a NmCliOutput,
    prefix: &'a str,
}

impl<'a> NmCliSection<'a> {
    fn full_key(&self, key: &str) -> String {
        format!("{}.{}", self.prefix, key)
    }

    /// Raw value, empty when the key is missing
    pub fn get(&self, key: &str) -> &'a str {
        self.output.raw(&self.full_key(key)).unwrap_or("")
    }

    /// Value, `None` when missing, empty or `--`
    pub fn value(&self, key: &str) -> Option<&'a str> {
        match self.get(key).trim() {
            "" | "--" => None,
            value => Some(value),
        }
    }

    /// Comma separated list value
    pub fn list(&self, key: &str) -> Vec<&'a str> {
        match self.value(key) {
            Some(value) => value.split(',').map(str::trim).filter(|v| !v.is_empty()).collect(),
            None => Vec::new(),
        }
    }

    /// Values of `KEY[1]`, `KEY[2]`, ... ordered by index
    pub fn indexed(&self, key: &str) -> Vec<&'a str> {
        let base = format!("{}[", self.full_key(key));
        let mut items: Vec<(usize, &'a str)> = self
            .output
            .values
            .iter()
            .filter_map(|(k, v)| {
                let index = k.strip_prefix(&base)?.strip_suffix(']')?.parse().ok()?;
                Some((index, v.as_str()))
            })
            .filter(|(_, v)| !v.is_empty() && *v != "--")
            .collect();
        items.sort_by_key(|(index, _)| *index);
        items.into_iter().map(|(_, v)| v).collect()
    }

    pub fn is_present(&self) -> bool {
        self.output.has_section(self.prefix)
    }
}

/// Split a terse listing row (`nmcli -t device status`) into its fields
pub fn split_terse_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = row.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => return Some((&line[..i], &line[i + 1..])),
            _ => escaped = false,
        }
    }
    None
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == ':' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Escape a value for use inside a double quoted shell word
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encode settings into `prefix.key "value" ` fragments, keeping field order
pub fn encode<'a, I, V>(prefix: &str, fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: AsRef<str>,
{
    fields
        .into_iter()
        .map(|(key, value)| format!("{}.{} \"{}\" ", prefix, key, escape_value(value.as_ref())))
        .collect()
}

/// nmcli boolean spelling
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn parse_yes_no(value: &str) -> bool {
    matches!(value.trim(), "yes" | "true" | "on" | "1")
}

/// Leading integer of values such as `1 (REORDER_HEADERS)` or `100 (connected)`
pub fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse().ok()
}
