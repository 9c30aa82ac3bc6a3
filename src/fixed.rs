//! Deterministic fixed-point arithmetic
//!
//! `Fixed<T, FRAC>` stores a signed integer of type `T` and reads it as
//! `raw / 2^FRAC`. Every operation works on the raw integer, so results are
//! bit-identical across platforms and frames:
//! - `+`, `-` and negation require equal precision and wrap on overflow
//! - `mul` yields `FRAC + RHS` fractional bits, `div` yields `FRAC - RHS`
//! - `convert` shifts between precisions; narrowing is an arithmetic right
//!   shift (negative values floor, nothing is ever rounded)
//!
//! Comparisons are raw-value comparisons and only exist between values of the
//! same precision. Convert explicitly before comparing across formats.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use glam::Vec2;

/// Signed integer types usable as fixed-point storage
pub trait FixedStorage: Copy + Default + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Total width in bits
    const BITS: u32;

    fn to_wide(self) -> i128;

    /// Narrow back to the storage width, wrapping like two's complement
    fn from_wide(wide: i128) -> Self;
}

macro_rules! impl_fixed_storage {
    ($($t:ty),*) => {
        $(
            impl FixedStorage for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn to_wide(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_wide(wide: i128) -> Self {
                    wide as $t
                }
            }
        )*
    };
}

impl_fixed_storage!(i8, i16, i32, i64);

/// Fixed-point number with `FRAC` fractional bits over storage `T`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed<T: FixedStorage, const FRAC: u32> {
    raw: T,
}

/// Plain 32-bit integer
pub type Fixed32_0 = Fixed<i32, 0>;
/// Positions (1/256 pixel)
pub type Fixed24_8 = Fixed<i32, 8>;
/// Velocities and accelerations
pub type Fixed16_16 = Fixed<i32, 16>;
/// Paddle rotation in degrees
pub type Fixed8_24 = Fixed<i32, 24>;
/// Pure fraction in [-0.5, 0.5)
pub type Fixed0_32 = Fixed<i32, 32>;

impl<T: FixedStorage, const FRAC: u32> Fixed<T, FRAC> {
    const VALID: () = assert!(
        FRAC <= T::BITS,
        "fractional bits exceed the storage width"
    );

    /// Wrap a raw stored integer without any shifting
    #[inline]
    pub const fn from_raw(raw: T) -> Self {
        let () = Self::VALID;
        Self { raw }
    }

    #[inline]
    pub fn raw(self) -> T {
        self.raw
    }

    #[inline]
    pub const fn frac_bits() -> u32 {
        FRAC
    }

    #[inline]
    fn wide(self) -> i128 {
        self.raw.to_wide()
    }

    #[inline]
    fn from_wide(wide: i128) -> Self {
        Self::from_raw(T::from_wide(wide))
    }

    /// Integer value `n` with zero fraction
    pub fn from_int(n: T) -> Self {
        Self::from_wide(n.to_wide() << FRAC)
    }

    /// `int + frac / 2^FRAC`, where `frac` is already in raw units
    pub fn from_parts(int: T, frac: T) -> Self {
        Self::from_wide((int.to_wide() << FRAC) + frac.to_wide())
    }

    /// `int + numer / denom`; the fraction truncates toward zero
    ///
    /// # Panics
    /// If `denom` is zero.
    pub fn from_ratio(int: T, numer: T, denom: T) -> Self {
        let denom = denom.to_wide();
        assert!(denom != 0, "fixed-point ratio with zero denominator");
        Self::from_wide((int.to_wide() << FRAC) + (numer.to_wide() << FRAC) / denom)
    }

    /// Truncating conversion from a float (toward zero)
    pub fn from_f32(value: f32) -> Self {
        debug_assert!(value.is_finite(), "non-finite value {value} into fixed point");
        let scaled = f64::from(value) * 2f64.powi(FRAC as i32);
        Self::from_wide(scaled as i128)
    }

    /// Change precision. Widening is exact; narrowing shifts right
    /// arithmetically and drops the low bits.
    pub fn convert<const TO: u32>(self) -> Fixed<T, TO> {
        let wide = self.wide();
        let shifted = if TO >= FRAC {
            wide << (TO - FRAC)
        } else {
            wide >> (FRAC - TO)
        };
        Fixed::<T, TO>::from_wide(shifted)
    }

    /// Raw product; the result carries `FRAC + RHS` fractional bits
    pub fn mul<const RHS: u32, const OUT: u32>(self, rhs: Fixed<T, RHS>) -> Fixed<T, OUT> {
        const {
            assert!(OUT == FRAC + RHS, "product precision must be FRAC + RHS");
        }
        Fixed::<T, OUT>::from_wide(self.wide() * rhs.wide())
    }

    /// Raw quotient; the result carries `FRAC - RHS` fractional bits
    ///
    /// # Panics
    /// If `rhs` is a raw zero.
    pub fn div<const RHS: u32, const OUT: u32>(self, rhs: Fixed<T, RHS>) -> Fixed<T, OUT> {
        self.checked_div(rhs)
            .unwrap_or_else(|| panic!("fixed-point division by zero"))
    }

    /// Like [`Fixed::div`], returning `None` for a raw-zero divisor
    pub fn checked_div<const RHS: u32, const OUT: u32>(
        self,
        rhs: Fixed<T, RHS>,
    ) -> Option<Fixed<T, OUT>> {
        const {
            assert!(
                FRAC >= RHS && OUT == FRAC - RHS,
                "quotient precision must be FRAC - RHS"
            );
        }
        let divisor = rhs.wide();
        if divisor == 0 {
            return None;
        }
        Some(Fixed::<T, OUT>::from_wide(self.wide() / divisor))
    }

    /// Integer part by arithmetic shift (floors negative values)
    #[inline]
    pub fn integer(self) -> T {
        T::from_wide(self.wide() >> FRAC)
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.wide() as f64 / 2f64.powi(FRAC as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}

impl<const FRAC: u32> Fixed<i32, FRAC> {
    /// `from_int` usable in constant expressions
    pub const fn const_int(n: i32) -> Self {
        Self::from_raw(n << FRAC)
    }
}

/// Float vector from a fixed-point pair, for use inside a single physics step
#[inline]
pub fn vec2<T: FixedStorage, const FRAC: u32>(x: Fixed<T, FRAC>, y: Fixed<T, FRAC>) -> Vec2 {
    Vec2::new(x.to_f32(), y.to_f32())
}

impl<T: FixedStorage, const FRAC: u32> Add for Fixed<T, FRAC> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from_wide(self.wide() + rhs.wide())
    }
}

impl<T: FixedStorage, const FRAC: u32> Sub for Fixed<T, FRAC> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from_wide(self.wide() - rhs.wide())
    }
}

impl<T: FixedStorage, const FRAC: u32> Neg for Fixed<T, FRAC> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::from_wide(-self.wide())
    }
}

impl<T: FixedStorage, const FRAC: u32> AddAssign for Fixed<T, FRAC> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: FixedStorage, const FRAC: u32> SubAssign for Fixed<T, FRAC> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: FixedStorage, const FRAC: u32> fmt::Display for Fixed<T, FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_int_shifts_into_place() {
        assert_eq!(Fixed24_8::from_int(3).raw(), 3 << 8);
        assert_eq!(Fixed16_16::from_int(-2).raw(), -2 << 16);
        assert_eq!(Fixed32_0::from_int(7).raw(), 7);
        assert_eq!(Fixed24_8::const_int(8), Fixed24_8::from_int(8));
    }

    #[test]
    fn test_from_parts_and_ratio() {
        assert_eq!(Fixed24_8::from_parts(1, 128).raw(), 256 + 128);
        // 1 + 1/3 truncates the fraction toward zero
        assert_eq!(Fixed16_16::from_ratio(1, 1, 3).raw(), 65536 + 21845);
        assert_eq!(Fixed16_16::from_ratio(0, -1, 3).raw(), -21845);
        assert_eq!(Fixed16_16::from_ratio(0, 1, 8).raw(), 8192);
    }

    #[test]
    #[should_panic(expected = "zero denominator")]
    fn test_from_ratio_zero_denominator() {
        let _ = Fixed16_16::from_ratio(1, 1, 0);
    }

    #[test]
    fn test_widening_conversion_is_exact() {
        let pos = Fixed24_8::from_raw(0x1234);
        let wide: Fixed16_16 = pos.convert();
        assert_eq!(wide.raw(), 0x1234 << 8);
        let back: Fixed24_8 = wide.convert();
        assert_eq!(back, pos);
    }

    #[test]
    fn test_narrowing_conversion_truncates() {
        let vel = Fixed16_16::from_raw(0x01FF);
        assert_eq!(vel.convert::<8>().raw(), 0x01);

        // Raw -1 at 16 bits is -1/65536; the arithmetic shift floors it to
        // -1/256 rather than truncating to zero.
        let tiny = Fixed16_16::from_raw(-1);
        assert_eq!(tiny.convert::<8>().raw(), -1);

        let neg = Fixed16_16::from_raw(-0x0180);
        assert_eq!(neg.convert::<8>().raw(), -2);
    }

    #[test]
    fn test_mul_adds_fraction_bits() {
        let a = Fixed24_8::from_int(2);
        let b = Fixed16_16::from_int(3);
        let product: Fixed8_24 = a.mul(b);
        assert_eq!(product.raw(), 6 << 24);
        assert_eq!(product.integer(), 6);
    }

    #[test]
    fn test_div_subtracts_fraction_bits() {
        let a = Fixed16_16::from_int(6);
        let b = Fixed24_8::from_int(2);
        let quotient: Fixed24_8 = a.div(b);
        assert_eq!(quotient, Fixed24_8::from_int(3));

        let int_quotient: Fixed32_0 = Fixed24_8::from_int(9).div(Fixed24_8::from_int(2));
        assert_eq!(int_quotient.raw(), 4);
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn test_div_by_raw_zero_panics() {
        let _: Fixed24_8 = Fixed16_16::from_int(1).div(Fixed24_8::from_raw(0));
    }

    #[test]
    fn test_checked_div_zero() {
        let q: Option<Fixed24_8> = Fixed16_16::from_int(1).checked_div(Fixed24_8::default());
        assert!(q.is_none());
    }

    #[test]
    fn test_integer_floors_negative() {
        assert_eq!(Fixed24_8::from_raw(-1).integer(), -1);
        assert_eq!(Fixed24_8::from_raw(-256).integer(), -1);
        assert_eq!(Fixed24_8::from_raw(-257).integer(), -2);
        assert_eq!(Fixed24_8::from_raw(255).integer(), 0);
    }

    #[test]
    fn test_full_fraction_format() {
        let quarter = Fixed0_32::from_raw(1 << 30);
        assert!((quarter.to_f64() - 0.25).abs() < 1e-12);
        assert_eq!(quarter.integer(), 0);
        assert_eq!(Fixed0_32::from_raw(-1).integer(), -1);
    }

    #[test]
    fn test_other_storage_widths() {
        let wide = Fixed::<i64, 32>::from_int(3);
        assert_eq!(wide.integer(), 3);
        assert_eq!(wide.raw(), 3i64 << 32);

        let small = Fixed::<i16, 4>::from_int(5);
        assert_eq!(small.raw(), 80);
        assert_eq!(small.convert::<2>().raw(), 20);
    }

    #[test]
    fn test_addition_wraps() {
        let max = Fixed24_8::from_raw(i32::MAX);
        let one = Fixed24_8::from_raw(1);
        assert_eq!((max + one).raw(), i32::MIN);
        assert_eq!((-Fixed24_8::from_raw(i32::MIN)).raw(), i32::MIN);
    }

    #[test]
    fn test_ordering_and_float() {
        let a = Fixed16_16::from_ratio(1, 1, 2);
        let b = Fixed16_16::from_int(1);
        assert!(a > b);
        assert!(-a < b);
        assert_eq!(a.to_f32(), 1.5);
        assert_eq!(Fixed24_8::from_f32(-1.999).raw(), -511);
        assert_eq!(format!("{}", Fixed24_8::from_raw(384)), "1.5");
    }

    #[test]
    fn test_vec2_helper() {
        let v = vec2(Fixed24_8::from_int(3), Fixed24_8::from_raw(-128));
        assert_eq!(v, Vec2::new(3.0, -0.5));
    }

    proptest! {
        #[test]
        fn prop_add_sub_round_trip(a in any::<i32>(), b in any::<i32>()) {
            let a = Fixed16_16::from_raw(a);
            let b = Fixed16_16::from_raw(b);
            prop_assert_eq!((a + b) - b, a);
        }

        #[test]
        fn prop_integer_of_from_int(n in -(1i32 << 23)..(1i32 << 23)) {
            prop_assert_eq!(Fixed24_8::from_int(n).integer(), n);
        }

        #[test]
        fn prop_narrowing_matches_shift(raw in any::<i32>()) {
            let narrowed: Fixed24_8 = Fixed16_16::from_raw(raw).convert();
            prop_assert_eq!(narrowed.raw(), raw >> 8);
        }

        #[test]
        fn prop_add_assign_matches_add(a in any::<i32>(), b in any::<i32>()) {
            let mut acc = Fixed8_24::from_raw(a);
            acc += Fixed8_24::from_raw(b);
            prop_assert_eq!(acc, Fixed8_24::from_raw(a) + Fixed8_24::from_raw(b));
            acc -= Fixed8_24::from_raw(b);
            prop_assert_eq!(acc.raw(), a);
        }
    }
}
