//! Arithmetic in GF(2^s) via log/antilog tables.

use crate::CodecError;

/// A binary extension field GF(2^symsize) generated by a primitive
/// polynomial. Elements are stored as `u16`, so `symsize <= 16`.
#[derive(Debug, Clone)]
pub struct GaloisField {
    symsize: u32,
    nn: usize,
    exp: Vec<u16>,
    log: Vec<u16>,
}

const NO_LOG: u16 = u16::MAX;

impl GaloisField {
    /// Builds the tables for `symsize` bits with field polynomial `gfpoly`
    /// (including the leading `x^symsize` term).
    ///
    /// Fails unless `gfpoly` is primitive, i.e. `x` generates every nonzero
    /// element.
    pub fn new(symsize: u32, gfpoly: u32) -> Result<Self, CodecError> {
        if !(2..=16).contains(&symsize) {
            return Err(CodecError::InvalidParams(format!(
                "symbol size must be in 2..=16, got {symsize}"
            )));
        }
        let size = 1u32 << symsize;
        if gfpoly & size == 0 || gfpoly >= size << 1 {
            return Err(CodecError::InvalidParams(format!(
                "field polynomial {gfpoly:#x} is not of degree {symsize}"
            )));
        }
        let nn = size as usize - 1;

        let mut exp = vec![0u16; nn];
        let mut log = vec![NO_LOG; size as usize];
        let mut x = 1u32;
        for (i, slot) in exp.iter_mut().enumerate() {
            if log[x as usize] != NO_LOG {
                return Err(CodecError::InvalidParams(format!(
                    "field polynomial {gfpoly:#x} is not primitive"
                )));
            }
            *slot = x as u16;
            log[x as usize] = i as u16;
            x <<= 1;
            if x & size != 0 {
                x ^= gfpoly;
            }
        }
        if x != 1 {
            return Err(CodecError::InvalidParams(format!(
                "field polynomial {gfpoly:#x} is not primitive"
            )));
        }

        Ok(Self {
            symsize,
            nn,
            exp,
            log,
        })
    }

    pub fn symsize(&self) -> u32 {
        self.symsize
    }

    /// Number of field elements, `2^symsize`.
    pub fn size(&self) -> u32 {
        1u32 << self.symsize
    }

    /// Order of the multiplicative group, `2^symsize - 1`.
    pub fn order(&self) -> usize {
        self.nn
    }

    /// `alpha^e` for any exponent.
    pub fn alpha_pow(&self, e: u64) -> u16 {
        self.exp[(e % self.nn as u64) as usize]
    }

    /// Discrete log of a nonzero element.
    pub fn log(&self, a: u16) -> usize {
        debug_assert!(a != 0, "log of zero");
        self.log[a as usize] as usize
    }

    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[(self.log(a) + self.log(b)) % self.nn]
    }

    /// `a / b`; `b` must be nonzero.
    pub fn div(&self, a: u16, b: u16) -> u16 {
        debug_assert!(b != 0, "division by zero");
        if a == 0 {
            return 0;
        }
        self.exp[(self.log(a) + self.nn - self.log(b)) % self.nn]
    }

    /// Evaluates a polynomial given highest-degree coefficient first.
    pub fn eval_msb(&self, coeffs: &[u16], x: u16) -> u16 {
        coeffs.iter().fold(0, |acc, &c| self.mul(acc, x) ^ c)
    }

    /// Evaluates a polynomial given lowest-degree coefficient first.
    pub fn eval_lsb(&self, coeffs: &[u16], x: u16) -> u16 {
        coeffs.iter().rev().fold(0, |acc, &c| self.mul(acc, x) ^ c)
    }
}
