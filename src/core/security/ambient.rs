//! Process-wide, overridable primitive registry.
//!
//! The registry is the mutable, globally reachable table that ordinary code
//! resolves byte/text primitives through. Any code running in the process can
//! replace or remove an entry, which is exactly what makes it untrustworthy
//! after startup. [`PrimitiveSnapshot::capture_from`](super::PrimitiveSnapshot::capture_from)
//! copies the entries out once; the validator never calls back into here.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use super::codec::{
    ByteSource, ConstructFn, DecodeFn, EncodeFn, Encoding, platform_construct, platform_decode,
    platform_encode,
};

static GLOBAL: AmbientRegistry = AmbientRegistry::platform();

/// Names of the primitives held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    DecodeBytesToText,
    EncodeTextToBytes,
    ConstructBytesFrom,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::DecodeBytesToText => write!(f, "decodeBytesToText"),
            Primitive::EncodeTextToBytes => write!(f, "encodeTextToBytes"),
            Primitive::ConstructBytesFrom => write!(f, "constructBytesFrom"),
        }
    }
}

#[derive(Clone, Copy)]
struct Slots {
    decode: Option<DecodeFn>,
    encode: Option<EncodeFn>,
    construct: Option<ConstructFn>,
}

/// A table of replaceable primitives, looked up on every call.
pub struct AmbientRegistry {
    slots: RwLock<Slots>,
}

impl AmbientRegistry {
    /// A registry seeded with the platform implementations.
    pub const fn platform() -> Self {
        Self {
            slots: RwLock::new(Slots {
                decode: Some(platform_decode),
                encode: Some(platform_encode),
                construct: Some(platform_construct),
            }),
        }
    }

    /// A registry with every slot unbound.
    pub const fn empty() -> Self {
        Self {
            slots: RwLock::new(Slots {
                decode: None,
                encode: None,
                construct: None,
            }),
        }
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static AmbientRegistry {
        &GLOBAL
    }

    fn read(&self) -> Slots {
        *self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Slots) -> R) -> R {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots)
    }

    /// Currently bound decode primitive, if any.
    pub fn decode(&self) -> Option<DecodeFn> {
        self.read().decode
    }

    /// Currently bound encode primitive, if any.
    pub fn encode(&self) -> Option<EncodeFn> {
        self.read().encode
    }

    /// Currently bound construct primitive, if any.
    pub fn construct(&self) -> Option<ConstructFn> {
        self.read().construct
    }

    /// Rebinds the decode primitive, returning the previous binding.
    pub fn replace_decode(&self, decode: DecodeFn) -> Option<DecodeFn> {
        self.write(|slots| slots.decode.replace(decode))
    }

    /// Rebinds the encode primitive, returning the previous binding.
    pub fn replace_encode(&self, encode: EncodeFn) -> Option<EncodeFn> {
        self.write(|slots| slots.encode.replace(encode))
    }

    /// Rebinds the construct primitive, returning the previous binding.
    pub fn replace_construct(&self, construct: ConstructFn) -> Option<ConstructFn> {
        self.write(|slots| slots.construct.replace(construct))
    }

    /// Unbinds a primitive.
    pub fn remove(&self, primitive: Primitive) {
        self.write(|slots| match primitive {
            Primitive::DecodeBytesToText => slots.decode = None,
            Primitive::EncodeTextToBytes => slots.encode = None,
            Primitive::ConstructBytesFrom => slots.construct = None,
        });
    }

    /// Restores the platform implementations in every slot.
    pub fn reset(&self) {
        self.write(|slots| {
            *slots = Slots {
                decode: Some(platform_decode),
                encode: Some(platform_encode),
                construct: Some(platform_construct),
            }
        });
    }

    /// Decodes through whatever is bound right now.
    pub fn call_decode(&self, bytes: &[u8], encoding: Encoding) -> Option<String> {
        self.decode().map(|decode| decode(bytes, encoding))
    }

    /// Encodes through whatever is bound right now.
    pub fn call_encode(&self, text: &str, encoding: Encoding) -> Option<Vec<u8>> {
        self.encode().map(|encode| encode(text, encoding))
    }

    /// Constructs through whatever is bound right now.
    pub fn call_construct(&self, source: ByteSource<'_>, encoding: Encoding) -> Option<Vec<u8>> {
        self.construct().map(|construct| construct(source, encoding))
    }
}

impl Default for AmbientRegistry {
    fn default() -> Self {
        Self::platform()
    }
}

impl fmt::Debug for AmbientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.read();
        f.debug_struct("AmbientRegistry")
            .field("decode", &slots.decode.is_some())
            .field("encode", &slots.encode.is_some())
            .field("construct", &slots.construct.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_is_visible_to_ambient_callers() {
        let registry = AmbientRegistry::platform();
        assert_eq!(
            registry.call_decode(b"a", Encoding::Utf8).as_deref(),
            Some("a")
        );

        let previous = registry.replace_decode(|_, _| "hijacked".to_string());
        assert!(previous.is_some());
        assert_eq!(
            registry.call_decode(b"a", Encoding::Utf8).as_deref(),
            Some("hijacked")
        );
    }

    #[test]
    fn test_remove_unbinds_slot() {
        let registry = AmbientRegistry::platform();
        registry.remove(Primitive::ConstructBytesFrom);
        assert!(registry.construct().is_none());
        assert!(
            registry
                .call_construct(ByteSource::Text("x"), Encoding::Utf8)
                .is_none()
        );
        assert!(registry.decode().is_some());
    }

    #[test]
    fn test_reset_restores_platform() {
        let registry = AmbientRegistry::empty();
        assert!(registry.encode().is_none());
        registry.reset();
        assert_eq!(
            registry.call_encode("ok", Encoding::Utf8),
            Some(b"ok".to_vec())
        );
    }

    #[test]
    fn test_debug_reports_bound_slots() {
        let registry = AmbientRegistry::empty();
        registry.replace_encode(|text, _| text.as_bytes().to_vec());
        let debug_str = format!("{:?}", registry);
        assert!(debug_str.contains("encode: true"));
        assert!(debug_str.contains("decode: false"));
    }
}
