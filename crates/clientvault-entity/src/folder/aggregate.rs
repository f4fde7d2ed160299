//! Subtree aggregate counters.

use std::ops::{Add, AddAssign, Neg};

use serde::{Deserialize, Serialize};

/// Folder, file, and byte totals for a subtree, or a delta applied to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Number of folders.
    pub folders: i64,
    /// Number of files.
    pub files: i64,
    /// Sum of file sizes in bytes.
    pub bytes: i64,
}

impl Aggregates {
    /// Delta for one new folder.
    pub fn one_folder() -> Self {
        Self {
            folders: 1,
            files: 0,
            bytes: 0,
        }
    }

    /// Delta for one file of `size` bytes.
    pub fn one_file(size: i64) -> Self {
        Self {
            folders: 0,
            files: 1,
            bytes: size,
        }
    }

    /// Whether every counter is zero.
    pub fn is_zero(&self) -> bool {
        self.folders == 0 && self.files == 0 && self.bytes == 0
    }
}

impl Add for Aggregates {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            folders: self.folders + rhs.folders,
            files: self.files + rhs.files,
            bytes: self.bytes + rhs.bytes,
        }
    }
}

impl AddAssign for Aggregates {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Neg for Aggregates {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            folders: -self.folders,
            files: -self.files,
            bytes: -self.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_negate() {
        let mut total = Aggregates::one_folder();
        total += Aggregates::one_file(120);
        total += Aggregates::one_file(30);
        assert_eq!(
            total,
            Aggregates {
                folders: 1,
                files: 2,
                bytes: 150
            }
        );
        assert!((total + -total).is_zero());
    }
}
