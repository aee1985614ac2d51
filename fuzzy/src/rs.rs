//! Systematic Reed-Solomon codes over GF(2^symsize).
//!
//! # Layout
//!
//! A codeword of `n` symbols is the `m` message symbols followed by
//! `n - m` parity symbols. Symbol `j` is the coefficient of `x^(n-1-j)`;
//! codes with `n < 2^symsize - 1` are shortened by implicit leading zeros.
//!
//! # Field Defaults
//!
//! Each symbol size has a fixed field polynomial, first consecutive root
//! (`fcr`) and primitive element index (`prim`). The generator polynomial
//! has roots `alpha^(prim * (fcr + i))` for `i in 0..n-m`. Symbol size 8
//! uses the CCSDS convention (`0x187`, 112, 11).
//!
//! # Decoding
//!
//! Syndromes, Berlekamp-Massey, Chien search and Forney, then a syndrome
//! re-check on the corrected word. Decoding succeeds only within
//! `t = (n - m) / 2` symbol errors.

use serde::{Deserialize, Serialize};

use crate::gf::GaloisField;
use crate::CodecError;

/// Code dimensions shared by both peers of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeParams {
    /// Codeword length in symbols (default: 512).
    pub n: usize,
    /// Message length in symbols (default: 152).
    pub m: usize,
    /// Bits per symbol (default: 10).
    pub symsize: u32,
}

impl Default for CodeParams {
    fn default() -> Self {
        Self {
            n: 512,
            m: 152,
            symsize: 10,
        }
    }
}

impl CodeParams {
    pub fn new(n: usize, m: usize, symsize: u32) -> Self {
        Self { n, m, symsize }
    }

    /// Number of parity symbols.
    pub fn nroots(&self) -> usize {
        self.n.saturating_sub(self.m)
    }

    /// Correctable symbol errors, `floor((n - m) / 2)`.
    pub fn capacity(&self) -> usize {
        self.nroots() / 2
    }

    /// Exclusive upper bound on symbol values, `2^symsize`.
    pub fn symbol_limit(&self) -> u32 {
        1u32 << self.symsize.min(16)
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if !(2..=16).contains(&self.symsize) {
            return Err(CodecError::InvalidParams(format!(
                "symbol size must be in 2..=16, got {}",
                self.symsize
            )));
        }
        let max_len = (1usize << self.symsize) - 1;
        if self.n > max_len {
            return Err(CodecError::InvalidParams(format!(
                "codeword length {} exceeds {max_len} for {}-bit symbols",
                self.n, self.symsize
            )));
        }
        if self.m == 0 || self.m >= self.n {
            return Err(CodecError::InvalidParams(format!(
                "message length must be in 1..{}, got {}",
                self.n, self.m
            )));
        }
        Ok(())
    }

    /// Checks that `symbols` has length `expected` and every value fits.
    pub fn check_symbols(&self, symbols: &[u16], expected: usize) -> Result<(), CodecError> {
        if symbols.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                got: symbols.len(),
            });
        }
        let limit = self.symbol_limit();
        match symbols.iter().position(|&s| s as u32 >= limit) {
            Some(index) => Err(CodecError::SymbolOutOfRange {
                index,
                value: symbols[index],
                limit,
            }),
            None => Ok(()),
        }
    }
}

/// Field polynomial, first consecutive root and primitive element index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub gfpoly: u32,
    pub fcr: usize,
    pub prim: usize,
}

impl FieldSpec {
    /// Default field for a symbol size.
    pub fn for_symsize(symsize: u32) -> Option<Self> {
        let (gfpoly, fcr, prim) = match symsize {
            2 => (0x7, 1, 1),
            3 => (0xb, 1, 1),
            4 => (0x13, 1, 1),
            5 => (0x25, 1, 1),
            6 => (0x43, 1, 1),
            7 => (0x89, 1, 1),
            8 => (0x187, 112, 11),
            9 => (0x211, 1, 1),
            10 => (0x409, 1, 1),
            11 => (0x805, 1, 1),
            12 => (0x1053, 1, 1),
            13 => (0x201b, 1, 1),
            14 => (0x4443, 1, 1),
            15 => (0x8003, 1, 1),
            16 => (0x1100b, 1, 1),
            _ => return None,
        };
        Some(Self { gfpoly, fcr, prim })
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The corrected codeword.
    pub codeword: Vec<u16>,
    /// Corrected symbol positions, ascending.
    pub corrected: Vec<usize>,
}

/// Encode/decode contract consumed by the fuzzy commitment.
pub trait SymbolCodec: Send + Sync {
    fn params(&self) -> CodeParams;

    /// Encodes `m` message symbols into an `n`-symbol codeword.
    fn encode(&self, message: &[u16]) -> Result<Vec<u16>, CodecError>;

    /// Bounded-distance decodes an `n`-symbol word.
    fn decode(&self, received: &[u16]) -> Result<Decoded, CodecError>;
}

/// Reed-Solomon codec for one parameter set.
#[derive(Debug, Clone)]
pub struct ReedSolomon {
    params: CodeParams,
    gf: GaloisField,
    fcr: usize,
    prim: usize,
    /// Generator polynomial, lowest degree first, monic.
    genpoly: Vec<u16>,
}

impl ReedSolomon {
    /// Creates a codec with the default field for `params.symsize`.
    pub fn new(params: CodeParams) -> Result<Self, CodecError> {
        params.validate()?;
        let spec = FieldSpec::for_symsize(params.symsize).ok_or_else(|| {
            CodecError::InvalidParams(format!("no field for symbol size {}", params.symsize))
        })?;
        Self::with_field(params, spec)
    }

    /// Creates a codec over an explicit field.
    pub fn with_field(params: CodeParams, spec: FieldSpec) -> Result<Self, CodecError> {
        params.validate()?;
        let gf = GaloisField::new(params.symsize, spec.gfpoly)?;
        if spec.prim == 0 || gcd(spec.prim, gf.order()) != 1 {
            return Err(CodecError::InvalidParams(format!(
                "primitive element index {} is not coprime with {}",
                spec.prim,
                gf.order()
            )));
        }

        let nroots = params.nroots();
        let mut genpoly = vec![0u16; nroots + 1];
        genpoly[0] = 1;
        for i in 0..nroots {
            let root = gf.alpha_pow((spec.prim * (spec.fcr + i)) as u64);
            // genpoly *= (x + root)
            for k in (1..=i + 1).rev() {
                genpoly[k] = genpoly[k - 1] ^ gf.mul(genpoly[k], root);
            }
            genpoly[0] = gf.mul(genpoly[0], root);
        }

        Ok(Self {
            params,
            gf,
            fcr: spec.fcr,
            prim: spec.prim,
            genpoly,
        })
    }

    fn syndromes(&self, word: &[u16]) -> Vec<u16> {
        (0..self.params.nroots())
            .map(|i| {
                let root = self.gf.alpha_pow((self.prim * (self.fcr + i)) as u64);
                self.gf.eval_msb(word, root)
            })
            .collect()
    }

    /// Error locator polynomial (lowest degree first) and its length.
    fn berlekamp_massey(&self, syndromes: &[u16]) -> (Vec<u16>, usize) {
        let gf = &self.gf;
        let mut lambda = vec![0u16; syndromes.len() + 1];
        let mut prev = lambda.clone();
        lambda[0] = 1;
        prev[0] = 1;
        let mut len = 0usize;
        let mut gap = 1usize;
        let mut prev_disc = 1u16;

        for r in 0..syndromes.len() {
            let mut disc = syndromes[r];
            for i in 1..=len {
                disc ^= gf.mul(lambda[i], syndromes[r - i]);
            }
            if disc == 0 {
                gap += 1;
                continue;
            }

            let scale = gf.div(disc, prev_disc);
            let snapshot = lambda.clone();
            for i in gap..lambda.len() {
                lambda[i] ^= gf.mul(scale, prev[i - gap]);
            }
            if 2 * len <= r {
                len = r + 1 - len;
                prev = snapshot;
                prev_disc = disc;
                gap = 1;
            } else {
                gap += 1;
            }
        }
        lambda.truncate(len + 1);
        (lambda, len)
    }
}

impl SymbolCodec for ReedSolomon {
    fn params(&self) -> CodeParams {
        self.params
    }

    fn encode(&self, message: &[u16]) -> Result<Vec<u16>, CodecError> {
        self.params.check_symbols(message, self.params.m)?;
        let nroots = self.params.nroots();

        // parity[0] holds the x^(nroots-1) coefficient of the remainder.
        let mut parity = vec![0u16; nroots];
        for &symbol in message {
            let feedback = symbol ^ parity[0];
            parity.rotate_left(1);
            parity[nroots - 1] = 0;
            if feedback != 0 {
                for (j, p) in parity.iter_mut().enumerate() {
                    *p ^= self.gf.mul(feedback, self.genpoly[nroots - 1 - j]);
                }
            }
        }

        let mut codeword = Vec::with_capacity(self.params.n);
        codeword.extend_from_slice(message);
        codeword.extend_from_slice(&parity);
        Ok(codeword)
    }

    fn decode(&self, received: &[u16]) -> Result<Decoded, CodecError> {
        let n = self.params.n;
        self.params.check_symbols(received, n)?;
        let gf = &self.gf;
        let nn = gf.order() as u64;

        let syndromes = self.syndromes(received);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(Decoded {
                codeword: received.to_vec(),
                corrected: Vec::new(),
            });
        }

        let (lambda, degree) = self.berlekamp_massey(&syndromes);
        if degree == 0 || degree > self.params.capacity() {
            return Err(CodecError::Uncorrectable("too many errors"));
        }

        // Chien search: an error at degree k has locator alpha^(prim*k).
        let mut locations = Vec::with_capacity(degree);
        for k in 0..n {
            let log_x = (self.prim as u64 * k as u64) % nn;
            let x_inv = gf.alpha_pow(nn - log_x);
            if gf.eval_lsb(&lambda, x_inv) == 0 {
                locations.push(k);
                if locations.len() > degree {
                    break;
                }
            }
        }
        if locations.len() != degree {
            return Err(CodecError::Uncorrectable("error locator roots do not match its degree"));
        }

        // omega = syndromes * lambda mod x^nroots
        let omega: Vec<u16> = (0..syndromes.len())
            .map(|i| {
                (0..=i.min(degree)).fold(0, |acc, j| acc ^ gf.mul(lambda[j], syndromes[i - j]))
            })
            .collect();
        // formal derivative: only odd powers survive in characteristic 2
        let lambda_prime: Vec<u16> = (1..lambda.len())
            .map(|i| if i % 2 == 1 { lambda[i] } else { 0 })
            .collect();

        let fcr_factor = (1 + nn - (self.fcr as u64 % nn)) % nn;
        let mut codeword = received.to_vec();
        let mut corrected = Vec::with_capacity(degree);
        for &k in &locations {
            let log_x = (self.prim as u64 * k as u64) % nn;
            let x_inv = gf.alpha_pow(nn - log_x);
            let den = gf.eval_lsb(&lambda_prime, x_inv);
            if den == 0 {
                return Err(CodecError::Uncorrectable("zero locator derivative"));
            }
            let num = gf.eval_lsb(&omega, x_inv);
            let magnitude = gf.mul(gf.alpha_pow(log_x * fcr_factor), gf.div(num, den));
            if magnitude == 0 {
                return Err(CodecError::Uncorrectable("zero error magnitude"));
            }
            let position = n - 1 - k;
            codeword[position] ^= magnitude;
            corrected.push(position);
        }

        if self.syndromes(&codeword).iter().any(|&s| s != 0) {
            return Err(CodecError::Uncorrectable("corrected word is not a codeword"));
        }
        corrected.sort_unstable();
        Ok(Decoded {
            codeword,
            corrected,
        })
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::index::sample;
    use rand::{Rng, SeedableRng};

    fn random_symbols(rng: &mut StdRng, len: usize, limit: u32) -> Vec<u16> {
        (0..len).map(|_| rng.gen_range(0..limit) as u16).collect()
    }

    fn corrupt(rng: &mut StdRng, word: &mut [u16], count: usize, limit: u32) -> Vec<usize> {
        let mut positions: Vec<usize> = sample(rng, word.len(), count).into_vec();
        positions.sort_unstable();
        for &p in &positions {
            let flip = rng.gen_range(1..limit) as u16;
            word[p] ^= flip;
        }
        positions
    }

    #[test]
    fn default_params() {
        let p = CodeParams::default();
        assert_eq!((p.n, p.m, p.symsize), (512, 152, 10));
        assert_eq!(p.capacity(), 180);
        assert_eq!(p.symbol_limit(), 1024);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn param_validation() {
        assert!(CodeParams::new(1024, 152, 10).validate().is_err());
        assert!(CodeParams::new(1023, 152, 10).validate().is_ok());
        assert!(CodeParams::new(512, 512, 10).validate().is_err());
        assert!(CodeParams::new(512, 0, 10).validate().is_err());
        assert!(CodeParams::new(3, 1, 1).validate().is_err());
        assert!(CodeParams::new(3, 1, 17).validate().is_err());
        assert!(ReedSolomon::new(CodeParams::new(16, 8, 4)).is_err());
    }

    #[test]
    fn encode_is_systematic_and_valid() {
        let rs = ReedSolomon::new(CodeParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let message = random_symbols(&mut rng, 152, 1024);
        let codeword = rs.encode(&message).unwrap();
        assert_eq!(codeword.len(), 512);
        assert_eq!(&codeword[..152], &message[..]);
        assert!(rs.syndromes(&codeword).iter().all(|&s| s == 0));
    }

    #[test]
    fn encode_rejects_bad_input() {
        let rs = ReedSolomon::new(CodeParams::new(15, 9, 4)).unwrap();
        assert_eq!(
            rs.encode(&[0; 8]).unwrap_err(),
            CodecError::LengthMismatch { expected: 9, got: 8 }
        );
        let mut msg = vec![0u16; 9];
        msg[4] = 16;
        assert_eq!(
            rs.encode(&msg).unwrap_err(),
            CodecError::SymbolOutOfRange { index: 4, value: 16, limit: 16 }
        );
    }

    #[test]
    fn clean_word_decodes_without_corrections() {
        let rs = ReedSolomon::new(CodeParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let codeword = rs.encode(&random_symbols(&mut rng, 152, 1024)).unwrap();
        let decoded = rs.decode(&codeword).unwrap();
        assert_eq!(decoded.codeword, codeword);
        assert!(decoded.corrected.is_empty());
    }

    #[test]
    fn corrects_up_to_capacity() {
        let rs = ReedSolomon::new(CodeParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for errors in [1, 17, 90, 179, 180] {
            let codeword = rs.encode(&random_symbols(&mut rng, 152, 1024)).unwrap();
            let mut received = codeword.clone();
            let positions = corrupt(&mut rng, &mut received, errors, 1024);

            let decoded = rs.decode(&received).unwrap();
            assert_eq!(decoded.codeword, codeword, "{errors} errors");
            assert_eq!(decoded.corrected, positions);
        }
    }

    #[test]
    fn fails_beyond_capacity() {
        let rs = ReedSolomon::new(CodeParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for errors in [181, 200, 300] {
            let codeword = rs.encode(&random_symbols(&mut rng, 152, 1024)).unwrap();
            let mut received = codeword.clone();
            corrupt(&mut rng, &mut received, errors, 1024);
            assert!(
                matches!(rs.decode(&received), Err(CodecError::Uncorrectable(_))),
                "{errors} errors should not decode"
            );
        }
    }

    #[test]
    fn ccsds_field_with_non_unit_prim() {
        let rs = ReedSolomon::new(CodeParams::new(255, 223, 8)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let codeword = rs.encode(&random_symbols(&mut rng, 223, 256)).unwrap();
        let mut received = codeword.clone();
        let positions = corrupt(&mut rng, &mut received, 16, 256);
        let decoded = rs.decode(&received).unwrap();
        assert_eq!(decoded.codeword, codeword);
        assert_eq!(decoded.corrected, positions);
    }

    #[test]
    fn every_default_symbol_size_round_trips() {
        let mut rng = StdRng::seed_from_u64(6);
        for symsize in 2..=16u32 {
            let max_len = (1usize << symsize) - 1;
            let n = max_len.min(40);
            let m = n / 2;
            let params = CodeParams::new(n, m, symsize);
            let rs = ReedSolomon::new(params).unwrap();
            let limit = params.symbol_limit();
            let codeword = rs.encode(&random_symbols(&mut rng, m, limit)).unwrap();
            let mut received = codeword.clone();
            let positions = corrupt(&mut rng, &mut received, params.capacity(), limit);
            let decoded = rs.decode(&received).unwrap();
            assert_eq!(decoded.codeword, codeword, "symsize {symsize}");
            assert_eq!(decoded.corrected, positions, "symsize {symsize}");
        }
    }

    #[test]
    fn decode_checks_length() {
        let rs = ReedSolomon::new(CodeParams::default()).unwrap();
        assert!(matches!(
            rs.decode(&[0; 511]),
            Err(CodecError::LengthMismatch { expected: 512, got: 511 })
        ));
    }
}
