use serde_json::{Map, Value};

/// A partial update, expressed as dot-path assignments.
///
/// Built from a nested payload by flattening: object values recurse, while
/// scalars, nulls, arrays, and empty objects are leaves. Arrays are always
/// atomic so a measurement pair like `wristsCircumference` is replaced
/// whole, never spliced element by element. With `dot_notation` off the
/// payload's top-level fields become single-segment paths and replace their
/// targets wholesale.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    entries: Vec<(Vec<String>, Value)>,
}

impl UpdateDocument {
    pub fn from_payload(payload: &Value, dot_notation: bool) -> Self {
        let mut entries = vec![];
        if let Value::Object(map) = payload {
            if dot_notation {
                for (key, value) in map {
                    let mut prefix = split_key(key);
                    flatten_into(&mut prefix, value, &mut entries);
                }
            } else {
                for (key, value) in map {
                    entries.push((vec![key.clone()], value.clone()));
                }
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Vec<String>, Value)] {
        &self.entries
    }

    /// Proper prefixes of every entry path, deduplicated and ordered
    /// shortest first. Seeding these as empty objects before the leaf
    /// writes makes deep assignments independent of payload order.
    pub fn parent_paths(&self) -> Vec<Vec<String>> {
        let mut prefixes = vec![];
        for (path, _) in &self.entries {
            for end in 1..path.len() {
                prefixes.push(path[..end].to_vec());
            }
        }
        prefixes.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        prefixes.dedup();
        prefixes
    }

    /// Apply the update to a document in place.
    ///
    /// Phase one replaces every missing or non-object parent with `{}`;
    /// phase two sets the leaves in entry order. A leaf whose parent was
    /// scalar-ified by an earlier leaf write is skipped, matching what
    /// `jsonb_set` does on an untraversable path.
    pub fn apply(&self, doc: &mut Value) {
        if !doc.is_object() {
            return;
        }
        for prefix in self.parent_paths() {
            seed_object(doc, &prefix);
        }
        for (path, value) in &self.entries {
            set_leaf(doc, path, value.clone());
        }
    }
}

/// A dotted key addresses a nested field, the way document databases read
/// `"a.b"` in an update payload.
fn split_key(key: &str) -> Vec<String> {
    key.split('.').map(str::to_string).collect()
}

fn flatten_into(prefix: &mut Vec<String>, value: &Value, entries: &mut Vec<(Vec<String>, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let segments = split_key(key);
                let added = segments.len();
                prefix.extend(segments);
                flatten_into(prefix, child, entries);
                prefix.truncate(prefix.len() - added);
            }
        }
        leaf => entries.push((prefix.clone(), leaf.clone())),
    }
}

fn seed_object(doc: &mut Value, path: &[String]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = doc;
    for segment in parents {
        // Parents are seeded shortest-path-first, so these levels exist.
        match current.get_mut(segment) {
            Some(next) if next.is_object() => current = next,
            _ => return,
        }
    }
    if let Value::Object(map) = current {
        let slot = map
            .entry(last.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
    }
}

fn set_leaf(doc: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = doc;
    for segment in parents {
        match current.get_mut(segment) {
            Some(next) if next.is_object() => current = next,
            _ => return,
        }
    }
    if let Value::Object(map) = current {
        map.insert(last.clone(), value);
    }
}
