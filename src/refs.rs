//! Back-reference tables for the stringref (tags 256/25) and sharedref (tags 28/29) extensions.
//!
//! Both tables live for a single decode and are dropped with it.

use log::trace;

use crate::{CborError, CborValue, ErrorCode};

/// Append-only table of shared values, indexed from zero.
#[derive(Debug, Default)]
pub struct SharedRefs {
    slots: Vec<Option<CborValue>>,
}

impl SharedRefs {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded values, including reserved slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` iff nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a value unconditionally.
    pub fn add_object(&mut self, value: CborValue) {
        self.slots.push(Some(value));
    }

    /// Reserve a slot for a value that is still being decoded and return its index.
    pub(crate) fn reserve(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Fill a slot obtained from [`SharedRefs::reserve`].
    pub(crate) fn fill(&mut self, index: usize, value: CborValue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Look up a value by index.
    ///
    /// # Errors
    ///
    /// `ReferenceNegative` for a negative index, `ReferenceOutOfRange` for an index at or beyond
    /// the table length, `ReferenceRecursive` for a slot whose value is still being decoded.
    pub fn get_object(&self, index: i64) -> Result<CborValue, CborError> {
        let idx = usize::try_from(index).map_err(|_| {
            trace!("sharedref: negative index {index}");
            CborError::at_start(ErrorCode::ReferenceNegative)
        })?;
        match self.slots.get(idx) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(CborError::at_start(ErrorCode::ReferenceRecursive)),
            None => {
                trace!("sharedref: index {idx} out of range (len {})", self.slots.len());
                Err(CborError::at_start(ErrorCode::ReferenceOutOfRange))
            }
        }
    }
}

/// Stack of string tables, one per stringref namespace.
#[derive(Debug, Default)]
pub struct StringRefs {
    stack: Vec<Vec<CborValue>>,
}

/// Minimum string length worth recording in a table that already holds `entries` strings.
#[must_use]
pub const fn min_stringref_len(entries: usize) -> usize {
    if entries < 24 {
        3
    } else if entries < 256 {
        4
    } else if entries < 65_536 {
        5
    } else {
        7
    }
}

impl StringRefs {
    /// An empty stack with no namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff at least one namespace is open.
    #[must_use]
    pub fn in_namespace(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Number of open namespaces.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a new, empty namespace.
    pub fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Close the most recently opened namespace.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Record `value` (a text or byte string of encoded length `len`) in the innermost namespace
    /// if it is long enough to be worth referencing. Returns whether it was recorded.
    pub fn add_string_if_needed(&mut self, value: &CborValue, len: usize) -> bool {
        let Some(table) = self.stack.last_mut() else {
            return false;
        };
        if !matches!(value, CborValue::Text(_) | CborValue::Bytes(_)) {
            return false;
        }
        if len < min_stringref_len(table.len()) {
            return false;
        }
        table.push(value.clone());
        true
    }

    /// Look up a string in the innermost namespace.
    ///
    /// # Errors
    ///
    /// `ReferenceNegative` for a negative index, `ReferenceOutOfRange` outside a namespace or
    /// beyond the innermost table.
    pub fn get_string(&self, index: i64) -> Result<CborValue, CborError> {
        let idx = usize::try_from(index).map_err(|_| {
            trace!("stringref: negative index {index}");
            CborError::at_start(ErrorCode::ReferenceNegative)
        })?;
        self.stack
            .last()
            .and_then(|table| table.get(idx))
            .cloned()
            .ok_or_else(|| {
                trace!("stringref: index {idx} out of range");
                CborError::at_start(ErrorCode::ReferenceOutOfRange)
            })
    }
}
