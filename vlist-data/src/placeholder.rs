use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde_json::{Map, Value};

use crate::{Item, PlaceholderOptions};

/// Field set on every synthesized item.
pub const PLACEHOLDER_FLAG: &str = "_placeholder";

/// Returns `true` for items produced by [`PlaceholderSynthesizer::generate`].
pub fn is_placeholder(item: &Item) -> bool {
    item.get(PLACEHOLDER_FLAG).and_then(Value::as_bool) == Some(true)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    Number,
    Boolean,
    Array,
    Object,
    String,
}

/// Inferred shape of one item field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldShape {
    pub name: String,
    pub kind: FieldKind,
    pub min_len: usize,
    pub max_len: usize,
    pub avg_len: usize,
}

#[derive(Default)]
struct FieldStats {
    seen: usize,
    numbers: usize,
    booleans: usize,
    arrays: usize,
    objects: usize,
    lengths: Vec<usize>,
}

impl FieldStats {
    fn observe(&mut self, value: &Value) {
        self.seen += 1;
        match value {
            Value::Number(_) => self.numbers += 1,
            Value::Bool(_) => self.booleans += 1,
            Value::Array(_) => self.arrays += 1,
            Value::Object(_) => self.objects += 1,
            Value::String(s) => self.lengths.push(s.chars().count()),
            Value::Null => self.seen -= 1,
        }
    }

    fn shape(self, name: String) -> FieldShape {
        // Only nulls observed: masked text is the most neutral stand-in.
        let kind = if self.seen == 0 {
            FieldKind::String
        } else if self.numbers == self.seen {
            FieldKind::Number
        } else if self.booleans == self.seen {
            FieldKind::Boolean
        } else if self.arrays > 0 {
            FieldKind::Array
        } else if self.objects == self.seen {
            FieldKind::Object
        } else {
            FieldKind::String
        };
        let (min_len, max_len, avg_len) = if self.lengths.is_empty() {
            (0, 0, 0)
        } else {
            let min = self.lengths.iter().copied().min().unwrap_or(0);
            let max = self.lengths.iter().copied().max().unwrap_or(0);
            let sum: usize = self.lengths.iter().sum();
            let avg = (sum as f64 / self.lengths.len() as f64).round() as usize;
            (min, max, avg)
        };
        FieldShape {
            name,
            kind,
            min_len,
            max_len,
            avg_len,
        }
    }
}

/// Builds stand-in items shaped like the loaded ones.
///
/// Call [`Self::analyze`] with a sample of real items; afterwards [`Self::generate`] returns
/// an item with the same non-internal fields, neutral values and masked strings. Output for a
/// given index is stable until the next analysis.
#[derive(Clone, Debug)]
pub struct PlaceholderSynthesizer {
    options: PlaceholderOptions,
    id_field: String,
    fields: Vec<FieldShape>,
    analyzed: bool,
}

impl PlaceholderSynthesizer {
    pub fn new(options: PlaceholderOptions, id_field: impl Into<String>) -> Self {
        Self {
            options,
            id_field: id_field.into(),
            fields: Vec::new(),
            analyzed: false,
        }
    }

    pub fn options(&self) -> &PlaceholderOptions {
        &self.options
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    /// Infers field shapes from up to `sample_size` real items.
    ///
    /// Fields starting with `_` are internal and skipped. Returns `false` when the sample
    /// held no object items.
    pub fn analyze<'a>(&mut self, sample: impl IntoIterator<Item = &'a Item>) -> bool {
        let mut order: Vec<String> = Vec::new();
        let mut stats: Vec<FieldStats> = Vec::new();
        let mut objects = 0;

        let sample = sample
            .into_iter()
            .filter(|item| !is_placeholder(item))
            .filter_map(Value::as_object)
            .take(self.options.sample_size);
        for object in sample {
            objects += 1;
            for (name, value) in object {
                if name.starts_with('_') {
                    continue;
                }
                let slot = match order.iter().position(|n| n == name) {
                    Some(slot) => slot,
                    None => {
                        order.push(name.clone());
                        stats.push(FieldStats::default());
                        order.len() - 1
                    }
                };
                stats[slot].observe(value);
            }
        }
        if objects == 0 {
            return false;
        }

        self.fields = order
            .into_iter()
            .zip(stats)
            .map(|(name, stats)| stats.shape(name))
            .collect();
        self.analyzed = true;
        vdebug!(fields = self.fields.len(), sampled = objects, "placeholder shape analyzed");
        true
    }

    /// Forgets the analyzed shape.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.analyzed = false;
    }

    /// A placeholder for `index`.
    pub fn generate(&self, index: usize) -> Item {
        let mut rng = Pcg64::seed_from_u64(self.options.seed ^ index as u64);
        let mut object = Map::new();
        for field in &self.fields {
            let value = match field.kind {
                FieldKind::Number => Value::from(0),
                FieldKind::Boolean => Value::Bool(false),
                FieldKind::Array => Value::Array(Vec::new()),
                FieldKind::Object => Value::Object(Map::new()),
                FieldKind::String => {
                    let len = if self.options.randomize && field.max_len > field.min_len {
                        rng.random_range(field.min_len..=field.max_len)
                    } else {
                        field.avg_len
                    };
                    Value::String(std::iter::repeat_n(self.options.mask_char, len).collect())
                }
            };
            object.insert(field.name.clone(), value);
        }
        object.insert(
            self.id_field.clone(),
            Value::String(format!("__placeholder_{index}")),
        );
        object.insert(PLACEHOLDER_FLAG.to_owned(), Value::Bool(true));
        Value::Object(object)
    }

    /// Writes `real` into `slots` starting at `offset`, only where a slot is empty or holds a
    /// placeholder. Real data already present is left alone.
    ///
    /// Returns how many placeholders were replaced.
    pub fn replace(slots: &mut [Option<Item>], real: &[Item], offset: usize) -> usize {
        let mut replaced = 0;
        let targets = slots.iter_mut().skip(offset);
        for (slot, item) in targets.zip(real) {
            match slot {
                Some(existing) if is_placeholder(existing) => {
                    *existing = item.clone();
                    replaced += 1;
                }
                Some(_) => {}
                None => *slot = Some(item.clone()),
            }
        }
        replaced
    }
}
