use num_traits::{One, PrimInt};

/// Implemented by enums whose discriminant names one bit of a mask.
pub trait LayerBit {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A set of layer bits.
///
/// Used both as a collider's membership and as the filter of a query. A query "sees" a
/// collider when the two masks share at least one bit.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bitmask<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> Bitmask<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    pub fn of<U: LayerBit<Storage = T> + Copy>(layers: &[U]) -> Self {
        let mut mask = Self::empty();
        for &layer in layers {
            mask.insert(layer);
        }
        mask
    }

    pub fn insert<U: LayerBit<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits | layer.mask();
    }

    pub fn remove<U: LayerBit<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits & !layer.mask();
    }

    pub fn contains<U: LayerBit<Storage = T>>(&self, layer: U) -> bool {
        (self.bits & layer.mask()) != T::zero()
    }

    /// Mask with every bit of `other` cleared.
    pub fn without(self, other: Self) -> Self {
        Self::new(self.bits & !other.bits)
    }

    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a layer enum and implement [`LayerBit`] for it.
#[macro_export]
macro_rules! define_layers {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::layers::LayerBit for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_layers!(CollisionLayer, u32, {
    // Static level geometry: floors, walls, ramps.
    Ground,
    // Solid representation of authored rails.
    Rail,
});

pub type LayerMask = Bitmask<u32>;

impl LayerMask {
    /// Geometry a rail may be placed on.
    pub fn placement_targets() -> Self {
        Self::of(&[CollisionLayer::Ground])
    }

    /// Geometry that blocks rail segments and crouch clearance.
    pub fn blocking() -> Self {
        Self::of(&[CollisionLayer::Ground])
    }

    /// Everything a character body collides with by default.
    pub fn character_solids() -> Self {
        Self::of(&[CollisionLayer::Ground, CollisionLayer::Rail])
    }

    /// Layer bits packed into the low 32 bits of a collider's `user_data`.
    pub fn from_user_data(user_data: u128) -> Self {
        Self::new((user_data & 0xFFFF_FFFF) as u32)
    }

    pub fn single(layer: CollisionLayer) -> Self {
        Self::of(&[layer])
    }
}

/// Pack a collider's layer mask and owning object id into Rapier `user_data`.
///
/// - bits 0..=31  : layer mask
/// - bits 32..=63 : object id
pub fn pack_user_data(layers: LayerMask, object: u32) -> u128 {
    (layers.bits as u128) | ((object as u128) << 32)
}

/// Object id packed by [`pack_user_data`].
pub fn object_from_user_data(user_data: u128) -> u32 {
    ((user_data >> 32) & 0xFFFF_FFFF) as u32
}
