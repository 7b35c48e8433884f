//! Which chips need the lock, and with which value

use core::fmt;

use super::identify::ChipIdentity;

/// JEDEC manufacturer code of XMC
pub const XMC_MANUFACTURER_ID: u8 = 0x20;

/// SFDP bytes (0x06, 0xF4) of the revisions with the status register defect
pub const AFFECTED_SFDP_SIGNATURE: (u8, u8) = (0x02, 0xFF);

/// An XMC model known to need the status register lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedModel {
    /// Exact 24-bit JEDEC ID
    pub flash_id: u32,
    /// Part number
    pub name: &'static str,
    /// Status register composite to write (SR3 in bits 23-16)
    ///
    /// Block protection off, security registers unlocked, Quad Enable set,
    /// driver strength and dummy cycles at their factory defaults. SRP0/SRP1
    /// are left clear; the lock routine sets them.
    pub good_value: u32,
}

/// Affected models
///
/// Factory driver strength differs between capacities (25% for the 32 and
/// 128 Mbit parts, 75% for the 64 Mbit part), so each model has its own
/// value. Only exact matches are locked.
pub const AFFECTED_MODELS: &[AffectedModel] = &[
    AffectedModel {
        flash_id: 0x204016,
        name: "XM25QH32C",
        good_value: 0x600200,
    },
    AffectedModel {
        flash_id: 0x204017,
        name: "XM25QH64C",
        good_value: 0x200200,
    },
    AffectedModel {
        flash_id: 0x204018,
        name: "XM25QH128C",
        good_value: 0x600200,
    },
];

/// Look up an affected model by exact JEDEC ID
pub fn find_model(flash_id: u32) -> Option<&'static AffectedModel> {
    AFFECTED_MODELS.iter().find(|m| m.flash_id == flash_id)
}

/// What to do with an identified chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not an XMC chip
    NotXmc,
    /// XMC chip, but not a revision with the defect
    UnaffectedRevision,
    /// Defective revision of a model with no known good value
    UnsupportedModel,
    /// Lock the status registers with the model's good value
    Remediate(&'static AffectedModel),
}

impl Classification {
    /// Good value to write, if the chip should be locked
    pub fn good_value(&self) -> Option<u32> {
        match self {
            Self::Remediate(model) => Some(model.good_value),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotXmc => write!(f, "not an XMC chip"),
            Self::UnaffectedRevision => write!(f, "XMC chip, unaffected revision"),
            Self::UnsupportedModel => write!(f, "affected revision, unsupported model"),
            Self::Remediate(model) => {
                write!(f, "{} needs SR lock (good value {:06X})", model.name, model.good_value)
            }
        }
    }
}

/// Decide whether and how to lock a chip
///
/// Checked in order: vendor, SFDP revision signature, exact model.
pub fn classify(identity: &ChipIdentity) -> Classification {
    if !identity.is_xmc() {
        return Classification::NotXmc;
    }

    if (identity.sfdp_06, identity.sfdp_f4) != AFFECTED_SFDP_SIGNATURE {
        return Classification::UnaffectedRevision;
    }

    match find_model(identity.flash_id) {
        Some(model) => Classification::Remediate(model),
        None => Classification::UnsupportedModel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_xmc() {
        let id = ChipIdentity::new(0xEF4016, 0x02, 0xFF);
        assert_eq!(classify(&id), Classification::NotXmc);
    }

    #[test]
    fn test_unaffected_revision() {
        for (sfdp_06, sfdp_f4) in [(0x02, 0xFE), (0x01, 0xFF), (0xCC, 0xCC), (0xFF, 0x02)] {
            let id = ChipIdentity::new(0x204016, sfdp_06, sfdp_f4);
            assert_eq!(classify(&id), Classification::UnaffectedRevision);
        }
    }

    #[test]
    fn test_affected_models() {
        let expected = [
            (0x204016, 0x600200),
            (0x204017, 0x200200),
            (0x204018, 0x600200),
        ];
        for (flash_id, good_value) in expected {
            let id = ChipIdentity::new(flash_id, 0x02, 0xFF);
            assert_eq!(classify(&id).good_value(), Some(good_value));
        }
    }

    #[test]
    fn test_unsupported_model() {
        let id = ChipIdentity::new(0x204099, 0x02, 0xFF);
        assert_eq!(classify(&id), Classification::UnsupportedModel);
        assert_eq!(classify(&id).good_value(), None);
    }

    #[test]
    fn test_good_values_leave_srp_clear() {
        for model in AFFECTED_MODELS {
            assert_eq!(model.good_value & 0x180, 0, "{}", model.name);
            assert_eq!(model.good_value >> 24, 0, "{}", model.name);
        }
    }
}
