//! Input slot descriptors.
//!
//! Built-in operators declare their inputs through a static `SlotDescriptor`
//! array; scripted operators build theirs from the script. The system uses
//! the array length to validate connections and the names for the topology
//! snapshot handed to the canvas.

use std::borrow::Cow;

/// Descriptor for one input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub name: Cow<'static, str>,
}

impl SlotDescriptor {
    pub const fn input(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    /// Slot with a name only known at runtime.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
        }
    }
}

pub(crate) static NO_SLOTS: &[SlotDescriptor] = &[];
pub(crate) static SINGLE_SLOT: &[SlotDescriptor] = &[SlotDescriptor::input("A")];
pub(crate) static PAIR_SLOTS: &[SlotDescriptor] =
    &[SlotDescriptor::input("A"), SlotDescriptor::input("B")];
