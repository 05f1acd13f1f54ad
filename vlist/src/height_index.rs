use crate::{ConfigError, ItemSize};

/// Offset/size lookups over a strip of items.
///
/// Fixed-size lists answer everything by multiplication. Variable-size lists keep a
/// prefix-sum table (`prefix[i]` is the start of item `i`, `prefix[total]` the full extent)
/// which is rebuilt wholesale in `O(total)` and searched in `O(log total)`.
#[derive(Clone, Debug)]
pub struct HeightIndex {
    size: ItemSize,
    total: usize,
    prefix: Vec<f64>,
}

impl HeightIndex {
    pub fn new(size: ItemSize, total: usize) -> Result<Self, ConfigError> {
        let mut index = Self {
            size,
            total: 0,
            prefix: Vec::new(),
        };
        index.rebuild(total)?;
        Ok(index)
    }

    /// Recomputes the lookup tables for `total` items.
    ///
    /// On error the previous tables are kept.
    pub fn rebuild(&mut self, total: usize) -> Result<(), ConfigError> {
        match &self.size {
            ItemSize::Fixed(size) => {
                check_size(0, *size)?;
                self.prefix = Vec::new();
            }
            ItemSize::Fn(f) => {
                let mut prefix = Vec::with_capacity(total + 1);
                let mut acc = 0.0f64;
                prefix.push(acc);
                for i in 0..total {
                    let size = f(i);
                    check_size(i, size)?;
                    acc += size;
                    prefix.push(acc);
                }
                self.prefix = prefix;
            }
        }
        self.total = total;
        vdebug!(total, fixed = self.is_fixed(), "HeightIndex::rebuild");
        Ok(())
    }

    /// Swaps the size source and rebuilds for the current item count.
    pub fn set_item_size(&mut self, size: ItemSize) -> Result<(), ConfigError> {
        let prev = std::mem::replace(&mut self.size, size);
        if let Err(err) = self.rebuild(self.total) {
            self.size = prev;
            return Err(err);
        }
        Ok(())
    }

    pub fn item_size_source(&self) -> &ItemSize {
        &self.size
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.size, ItemSize::Fixed(_))
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Start offset of `index`. `index == total` yields the full extent; larger values clamp.
    pub fn offset(&self, index: usize) -> f64 {
        let index = index.min(self.total);
        match self.size {
            ItemSize::Fixed(size) => index as f64 * size,
            ItemSize::Fn(_) => self.prefix[index],
        }
    }

    /// Size of `index`, or `0.0` outside `[0, total)`.
    pub fn size(&self, index: usize) -> f64 {
        if index >= self.total {
            return 0.0;
        }
        match self.size {
            ItemSize::Fixed(size) => size,
            ItemSize::Fn(_) => self.prefix[index + 1] - self.prefix[index],
        }
    }

    pub fn total_size(&self) -> f64 {
        self.offset(self.total)
    }

    /// Mean item size, `0.0` for an empty list.
    pub fn average_size(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.total_size() / self.total as f64
    }

    /// Index of the item covering `offset`, clamped into `[0, total - 1]`.
    ///
    /// Negative offsets map to the first item and offsets at or past the end map to the last.
    /// An empty list always answers `0`.
    pub fn index_at_offset(&self, offset: f64) -> usize {
        if self.total == 0 || offset.is_nan() || offset <= 0.0 {
            return 0;
        }
        let last = self.total - 1;
        match self.size {
            ItemSize::Fixed(size) => {
                let i = (offset / size) as usize;
                i.min(last)
            }
            ItemSize::Fn(_) => {
                // Largest i such that prefix[i] <= offset.
                let consumed = self.prefix.partition_point(|&start| start <= offset);
                consumed.saturating_sub(1).min(last)
            }
        }
    }

    /// Fractional index at `offset`: the covering item plus how far into it `offset` falls.
    pub fn exact_index_at_offset(&self, offset: f64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let index = self.index_at_offset(offset);
        let size = self.size(index);
        let within = ((offset - self.offset(index)) / size).clamp(0.0, 1.0);
        index as f64 + within
    }

    /// Inverse of [`Self::exact_index_at_offset`].
    pub fn offset_at_exact_index(&self, exact: f64) -> f64 {
        if self.total == 0 || exact.is_nan() || exact <= 0.0 {
            return 0.0;
        }
        let index = (exact as usize).min(self.total);
        if index >= self.total {
            return self.total_size();
        }
        let within = exact - index as f64;
        self.offset(index) + within * self.size(index)
    }
}

fn check_size(index: usize, size: f64) -> Result<(), ConfigError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidItemSize { index, size })
    }
}
