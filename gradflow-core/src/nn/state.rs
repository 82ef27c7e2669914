//! Persisted network state.
//!
//! Binary layout, all integers little-endian:
//!
//! ```text
//! magic    [u8; 4] = b"GFST"
//! version  u32     = 1
//! count    u32
//! per entry:
//!   name_len u32, name [u8; name_len] (UTF-8)
//!   dtype    u8 (0 = F32, 1 = F64)
//!   rank     u32, dims [u64; rank]
//!   values   f32 or f64 per dtype
//! ```

use crate::array::NdArray;
use crate::error::{GradflowError, Result};
use crate::nn::module::Module;
use crate::types::DType;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"GFST";
const VERSION: u32 = 1;

fn dtype_to_u8(dtype: DType) -> u8 {
    match dtype {
        DType::F32 => 0,
        DType::F64 => 1,
    }
}

fn u8_to_dtype(v: u8) -> Result<DType> {
    match v {
        0 => Ok(DType::F32),
        1 => Ok(DType::F64),
        _ => Err(GradflowError::SerializationError(format!("unknown dtype tag {}", v))),
    }
}

/// Ordered named arrays holding the parameters and buffers of a module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkState {
    entries: Vec<(String, NdArray)>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of every named parameter followed by every named buffer.
    pub fn capture<M: Module + ?Sized>(module: &M) -> Self {
        let entries = module
            .named_parameters()
            .into_iter()
            .chain(module.named_buffers())
            .map(|(name, p)| (name, p.value()))
            .collect();
        NetworkState { entries }
    }

    /// Writes each stored value into the parameter or buffer of the same
    /// name. Every name of the module must be present with a matching dtype
    /// and shape; entries the module does not know are ignored with a warning.
    /// Nothing is written unless every entry checks out.
    pub fn restore<M: Module + ?Sized>(&self, module: &M) -> Result<()> {
        let targets: Vec<_> = module
            .named_parameters()
            .into_iter()
            .chain(module.named_buffers())
            .collect();
        let mut matched = Vec::with_capacity(targets.len());
        for (name, target) in &targets {
            let value = self
                .get(name)
                .ok_or_else(|| GradflowError::SerializationError(format!("state has no entry named {}", name)))?;
            let (dtype, shape) = target.with_value(|v| (v.dtype(), v.shape().to_vec()));
            if value.dtype() != dtype {
                return Err(GradflowError::DataTypeMismatch {
                    operation: format!("load state entry {}", name),
                    expected: dtype,
                    actual: value.dtype(),
                });
            }
            if value.shape() != shape.as_slice() {
                return Err(GradflowError::shape_mismatch(
                    &shape,
                    value.shape(),
                    &format!("load state entry {}", name),
                ));
            }
            matched.push((target, value));
        }
        for (target, value) in matched {
            target.set_value(value.clone())?;
        }
        for (name, _) in &self.entries {
            if !targets.iter().any(|(n, _)| n == name) {
                log::warn!("state entry {} has no counterpart in the module, skipped", name);
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: NdArray) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NdArray> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NdArray)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&len_u32(self.entries.len())?.to_le_bytes())?;
        for (name, value) in &self.entries {
            out.write_all(&len_u32(name.len())?.to_le_bytes())?;
            out.write_all(name.as_bytes())?;
            out.write_all(&[dtype_to_u8(value.dtype())])?;
            out.write_all(&len_u32(value.rank())?.to_le_bytes())?;
            for &d in value.shape() {
                out.write_all(&(d as u64).to_le_bytes())?;
            }
            let bytes: Vec<u8> = match value.dtype() {
                DType::F32 => value.data().iter().flat_map(|&v| (v as f32).to_le_bytes()).collect(),
                DType::F64 => value.data().iter().flat_map(|&v| v.to_le_bytes()).collect(),
            };
            out.write_all(&bytes)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut input: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(GradflowError::SerializationError(format!("bad magic {:?}", magic)));
        }
        let version = read_u32(&mut input)?;
        if version != VERSION {
            return Err(GradflowError::SerializationError(format!(
                "unsupported state version {}",
                version
            )));
        }
        let count = read_u32(&mut input)? as usize;
        let mut state = NetworkState::new();
        for _ in 0..count {
            let name_len = read_u32(&mut input)? as u64;
            let name = read_bytes(&mut input, name_len)?;
            let name = String::from_utf8(name)
                .map_err(|e| GradflowError::SerializationError(format!("entry name is not UTF-8: {}", e)))?;
            let mut tag = [0u8; 1];
            input.read_exact(&mut tag)?;
            let dtype = u8_to_dtype(tag[0])?;
            let rank = read_u32(&mut input)?;
            let mut shape = Vec::new();
            let mut byte_len = dtype.size_of() as u64;
            for _ in 0..rank {
                let mut buf = [0u8; 8];
                input.read_exact(&mut buf)?;
                let dim = u64::from_le_bytes(buf);
                byte_len = byte_len.checked_mul(dim).ok_or_else(|| {
                    GradflowError::SerializationError(format!("entry {} has an oversized shape", name))
                })?;
                let dim = usize::try_from(dim).map_err(|_| {
                    GradflowError::SerializationError(format!("dimension {} of entry {} does not fit in usize", dim, name))
                })?;
                shape.push(dim);
            }
            let bytes = read_bytes(&mut input, byte_len)?;
            let data: Vec<f64> = match dtype {
                DType::F32 => bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
                    .collect(),
                DType::F64 => bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            };
            state.entries.push((name, NdArray::with_dtype(data, shape, dtype)?));
        }
        Ok(state)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| GradflowError::SerializationError(format!("length {} does not fit in u32", len)))
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads exactly `len` bytes. The buffer grows with the bytes that arrive,
/// not with the length announced in the header.
fn read_bytes<R: Read>(input: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    input.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) != len {
        return Err(GradflowError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", len, bytes.len()),
        )));
    }
    Ok(bytes)
}

/// Writes the state of `module` to `out`.
pub fn save_state<M: Module + ?Sized, W: Write>(module: &M, out: W) -> Result<()> {
    module.state().write_to(out)
}

/// Reads a state from `input` and restores it into `module`.
pub fn load_state<M: Module + ?Sized, R: Read>(module: &M, input: R) -> Result<()> {
    NetworkState::read_from(input)?.restore(module)
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
