//! Opaque key/value words and the stock hash/equality collaborators.
//!
//! The table treats keys and values as opaque words. `Opaque` exposes the
//! one thing the table needs to know about them: their address-like value,
//! where zero means "null". Identity hashing for pointer-valued keys is
//! built on the same word.

use core::hash::BuildHasher;
use core::ptr::NonNull;
use foldhash::fast::FixedState;
use std::rc::Rc;

/// A value that can be viewed as a pointer-sized word.
///
/// `addr()` returns the word; it is `0` for the null representation.
pub trait Opaque {
    fn addr(&self) -> usize;

    #[inline]
    fn is_null(&self) -> bool {
        self.addr() == 0
    }
}

macro_rules! opaque_int {
    ($($t:ty),*) => {
        $(
            impl Opaque for $t {
                #[inline]
                fn addr(&self) -> usize {
                    *self as usize
                }
            }
        )*
    };
}

opaque_int!(usize, isize, u8, i8, u16, i16, u32, i32, u64, i64);

impl<T: ?Sized> Opaque for *const T {
    #[inline]
    fn addr(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> Opaque for *mut T {
    #[inline]
    fn addr(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> Opaque for NonNull<T> {
    #[inline]
    fn addr(&self) -> usize {
        self.as_ptr().cast::<()>() as usize
    }
}

impl<T: ?Sized> Opaque for &T {
    #[inline]
    fn addr(&self) -> usize {
        (*self as *const T).cast::<()>() as usize
    }
}

impl<T: ?Sized> Opaque for Box<T> {
    #[inline]
    fn addr(&self) -> usize {
        (&**self as *const T).cast::<()>() as usize
    }
}

impl<T: ?Sized> Opaque for Rc<T> {
    #[inline]
    fn addr(&self) -> usize {
        Rc::as_ptr(self).cast::<()>() as usize
    }
}

impl Opaque for String {
    #[inline]
    fn addr(&self) -> usize {
        self.as_ptr() as usize
    }
}

impl<T: Opaque> Opaque for Option<T> {
    #[inline]
    fn addr(&self) -> usize {
        self.as_ref().map_or(0, Opaque::addr)
    }
}

/// Identity hash: the key's word truncated to 32 bits.
pub fn direct_hash<K: Opaque + ?Sized>(key: &K) -> u32 {
    key.addr() as u32
}

/// Identity equality: two keys are equal when their words are.
pub fn direct_equal<K: Opaque + ?Sized>(a: &K, b: &K) -> bool {
    a.addr() == b.addr()
}

// Fixed seed so the hash of a string is stable for the life of the process.
const STRING_SEED: u64 = 0x243f_6a88_85a3_08d3;

/// Content hash for string keys, folded down to 32 bits.
pub fn string_hash<K: AsRef<str> + ?Sized>(key: &K) -> u32 {
    let h = FixedState::with_seed(STRING_SEED).hash_one(key.as_ref());
    (h ^ (h >> 32)) as u32
}

/// Content equality for string keys.
pub fn string_equal<K: AsRef<str> + ?Sized>(a: &K, b: &K) -> bool {
    a.as_ref() == b.as_ref()
}
