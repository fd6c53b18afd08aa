//! Static declaration of the LED Button Service attribute tree
//!
//! ```text
//! [0] Primary Service        00001523-...
//! [1] Characteristic decl    Button  (READ | NOTIFY)
//! [2] Characteristic value   Button  1 byte bool, perm READ
//! [3] CCCD                   notify enable
//! [4] Characteristic decl    LED     (WRITE)
//! [5] Characteristic value   LED     1 byte bool, perm WRITE
//! ```

use super::uuid::{Uuid128, LBS_BUTTON_UUID, LBS_LED_UUID, LBS_SERVICE_UUID};

/// Characteristic properties as carried in the characteristic declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties(u8);

impl Properties {
    pub const READ: Self = Self(0x02);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Access permissions on the characteristic value attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions(u8);

impl Permissions {
    pub const READ: Self = Self(0x01);
    pub const WRITE: Self = Self(0x02);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One characteristic of the service
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicDef {
    pub name: &'static str,
    pub uuid: Uuid128,
    pub properties: Properties,
    pub permissions: Permissions,
    /// Fixed value width in bytes
    pub value_len: usize,
    /// Whether a Client Characteristic Configuration descriptor follows the value
    pub cccd: bool,
}

impl CharacteristicDef {
    /// Attributes occupied: declaration, value, and the optional CCCD
    pub const fn attribute_count(&self) -> usize {
        if self.cccd {
            3
        } else {
            2
        }
    }
}

/// An immutable primary service definition
#[derive(Debug)]
pub struct ServiceDef {
    pub uuid: Uuid128,
    pub characteristics: &'static [CharacteristicDef],
}

impl ServiceDef {
    /// Attributes occupied by the service, including its declaration
    pub const fn attribute_count(&self) -> usize {
        let mut count = 1;
        let mut i = 0;
        while i < self.characteristics.len() {
            count += self.characteristics[i].attribute_count();
            i += 1;
        }
        count
    }

    /// Look up a characteristic by UUID
    pub fn characteristic(&self, uuid: &Uuid128) -> Option<&CharacteristicDef> {
        self.characteristics.iter().find(|c| &c.uuid == uuid)
    }
}

/// Button state: readable and notifiable
pub const BUTTON_CHARACTERISTIC: CharacteristicDef = CharacteristicDef {
    name: "button",
    uuid: LBS_BUTTON_UUID,
    properties: Properties::READ.union(Properties::NOTIFY),
    permissions: Permissions::READ,
    value_len: 1,
    cccd: true,
};

/// LED control: write only, the stored value is never exposed for read
pub const LED_CHARACTERISTIC: CharacteristicDef = CharacteristicDef {
    name: "led",
    uuid: LBS_LED_UUID,
    properties: Properties::WRITE,
    permissions: Permissions::WRITE,
    value_len: 1,
    cccd: false,
};

/// The LED Button Service
pub static LED_BUTTON_SERVICE: ServiceDef = ServiceDef {
    uuid: LBS_SERVICE_UUID,
    characteristics: &[BUTTON_CHARACTERISTIC, LED_CHARACTERISTIC],
};

/// Attributes of the service that peers can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Button characteristic value, also the target of notifications
    ButtonValue,
    /// Notify-enable descriptor of the button characteristic
    ButtonCccd,
    /// LED characteristic value
    LedValue,
}

impl Attribute {
    /// Index of this attribute in the service's attribute list
    pub const fn offset(self) -> usize {
        match self {
            Attribute::ButtonValue => 2,
            Attribute::ButtonCccd => 3,
            Attribute::LedValue => 5,
        }
    }

    /// Resolve an attribute list index; declarations are not addressable here
    pub const fn from_offset(offset: usize) -> Option<Self> {
        match offset {
            2 => Some(Attribute::ButtonValue),
            3 => Some(Attribute::ButtonCccd),
            5 => Some(Attribute::LedValue),
            _ => None,
        }
    }

    /// Characteristic this attribute belongs to
    pub const fn characteristic(self) -> &'static CharacteristicDef {
        match self {
            Attribute::ButtonValue | Attribute::ButtonCccd => &BUTTON_CHARACTERISTIC,
            Attribute::LedValue => &LED_CHARACTERISTIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(LED_BUTTON_SERVICE.attribute_count(), 6);
        assert_eq!(LED_BUTTON_SERVICE.characteristics.len(), 2);
        assert_eq!(LED_BUTTON_SERVICE.characteristics[0].uuid, LBS_BUTTON_UUID);
        assert_eq!(LED_BUTTON_SERVICE.characteristics[1].uuid, LBS_LED_UUID);
    }

    #[test]
    fn test_attribute_offsets_match_layout() {
        // Button value follows the service and characteristic declarations
        assert_eq!(Attribute::ButtonValue.offset(), 2);
        for attr in [Attribute::ButtonValue, Attribute::ButtonCccd, Attribute::LedValue] {
            assert_eq!(Attribute::from_offset(attr.offset()), Some(attr));
            assert!(attr.offset() < LED_BUTTON_SERVICE.attribute_count());
        }
        assert_eq!(Attribute::from_offset(0), None);
        assert_eq!(Attribute::from_offset(1), None);
        assert_eq!(Attribute::from_offset(4), None);
    }

    #[test]
    fn test_properties_and_permissions() {
        let button = LED_BUTTON_SERVICE.characteristic(&LBS_BUTTON_UUID).unwrap();
        assert_eq!(button.properties.bits(), 0x12);
        assert!(button.permissions.contains(Permissions::READ));
        assert!(!button.permissions.contains(Permissions::WRITE));
        assert!(button.cccd);

        let led = LED_BUTTON_SERVICE.characteristic(&LBS_LED_UUID).unwrap();
        assert_eq!(led.properties.bits(), 0x08);
        assert!(led.permissions.contains(Permissions::WRITE));
        assert!(!led.permissions.contains(Permissions::READ));
        assert!(!led.cccd);
    }
}
