//! The standard security handler (`/Filter /Standard`), revisions
//! R=2..6: password authentication, per-object key derivation, and the
//! encrypt/decrypt traversal that transparently covers strings and
//! stream bytes as they cross the object-model boundary.
pub mod pkcs5;
mod rc4;

use std::collections::HashMap;

use aes::cipher::block_padding::NoPadding;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use bitflags::bitflags;
use md5::{Digest, Md5};
use rand::RngCore;
use sha2::{Sha256, Sha384, Sha512};

use pkcs5::Pkcs5;
use rc4::rc4;

use crate::error::DecryptionError;
use crate::{Dictionary, Document, Error, Object, ObjectId, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// The fixed 32-byte padding string every R2-4 password is completed
/// with before hashing (PDF 32000-1, Algorithm 2).
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

bitflags! {
    /// Bit 1 is permanently reserved (and always clear in practice);
    /// bits are numbered per PDF 32000-1 Table 22, 1-indexed, so the
    /// constants below shift by `bit - 1`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: i32 {
        const PRINT                    = 1 << 2;
        const MODIFY                   = 1 << 3;
        const COPY                     = 1 << 4;
        const ANNOTATE                 = 1 << 5;
        const FILL_FORMS               = 1 << 8;
        const EXTRACT_FOR_ACCESSIBILITY = 1 << 9;
        const ASSEMBLE                 = 1 << 10;
        const PRINT_HIGH_QUALITY       = 1 << 11;
    }
}

impl Permissions {
    /// Every permission bit granted: what a successful owner-password
    /// authentication confers, independent of the dictionary's `/P`.
    pub fn owner() -> Self {
        Permissions::from_bits_truncate(-1)
    }
}

/// Which primitive a named crypt filter (`/CF`) performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptMethod {
    /// `/V2`: RC4.
    Rc4,
    /// `/AESV2`: AES-128-CBC.
    AesV2,
    /// `/AESV3`: AES-256-CBC.
    AesV3,
    /// `/Identity` (or an unrecognized method): pass-through.
    Identity,
}

pub type EncryptionVersion = i64;
pub type SecurityHandlerRevision = i64;

/// Everything needed to transparently encrypt/decrypt an already
/// authenticated document: the file key plus the per-purpose crypt
/// methods named by `/StmF`, `/StrF` and `/CF`.
#[derive(Debug, Clone)]
pub struct EncryptionState {
    pub version: EncryptionVersion,
    pub revision: SecurityHandlerRevision,
    pub file_key: Vec<u8>,
    pub key_length_bytes: usize,
    pub stream_method: EncryptMethod,
    pub string_method: EncryptMethod,
    pub named_filters: HashMap<Vec<u8>, EncryptMethod>,
    pub encrypt_metadata: bool,
}

impl EncryptionState {
    /// Authenticate `password` against `document`'s `/Encrypt`
    /// dictionary and build the resulting handler state.
    pub fn decode(document: &Document, password: &str) -> Result<Self> {
        authenticate(document, password).map(|(state, _permissions)| state)
    }

    pub fn describe(&self) -> String {
        format!("Standard security handler, V={} R={}", self.version, self.revision)
    }

    fn object_key(&self, method: EncryptMethod, id: ObjectId) -> Vec<u8> {
        match method {
            EncryptMethod::AesV3 => self.file_key.clone(),
            EncryptMethod::Identity => Vec::new(),
            EncryptMethod::Rc4 => derive_object_key(&self.file_key, id, false),
            EncryptMethod::AesV2 => derive_object_key(&self.file_key, id, true),
        }
    }

    fn transform(&self, method: EncryptMethod, id: ObjectId, data: &[u8], encrypt: bool) -> std::result::Result<Vec<u8>, DecryptionError> {
        match method {
            EncryptMethod::Identity => Ok(data.to_vec()),
            EncryptMethod::Rc4 => Ok(rc4(&self.object_key(method, id), data)),
            EncryptMethod::AesV2 => {
                let key = self.object_key(method, id);
                if encrypt {
                    Ok(aes128_encrypt(&key, data))
                } else {
                    aes128_decrypt(&key, data)
                }
            }
            EncryptMethod::AesV3 => {
                let key = self.object_key(method, id);
                if encrypt {
                    Ok(aes256_encrypt(&key, data))
                } else {
                    aes256_decrypt(&key, data)
                }
            }
        }
    }
}

/// RC4/AESV2 per-object key: `MD5(file_key || objnum[0..3] || gen[0..2]
/// [|| "sAlT"])`, truncated to `min(file_key_len + 5, 16)`.
fn derive_object_key(file_key: &[u8], id: ObjectId, is_aes: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(file_key.len() + 9);
    buf.extend_from_slice(file_key);
    buf.extend_from_slice(&id.0.to_le_bytes()[..3]);
    buf.extend_from_slice(&id.1.to_le_bytes()[..2]);
    if is_aes {
        buf.extend_from_slice(b"sAlT");
    }
    let digest = Md5::digest(&buf);
    let len = (file_key.len() + 5).min(16);
    digest[..len].to_vec()
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    if len < 32 {
        padded[len..].copy_from_slice(&PAD[..32 - len]);
    }
    padded
}

fn normalize_password(password: &str) -> Vec<u8> {
    let normalized = stringprep::saslprep(password).map(|s| s.into_owned()).unwrap_or_else(|_| password.to_string());
    let mut bytes = normalized.into_bytes();
    bytes.truncate(127);
    bytes
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}

// ---- R2-4 (RC4) key schedule: PDF 32000-1 Algorithms 2, 3, 6, 7 ----

fn compute_file_key_r234(password: &[u8], o: &[u8], p: i32, id0: &[u8], key_len: usize, revision: i64, encrypt_metadata: bool) -> Vec<u8> {
    let padded = pad_password(password);
    let mut buf = Vec::with_capacity(32 + o.len() + 4 + id0.len() + 4);
    buf.extend_from_slice(&padded);
    buf.extend_from_slice(&o[..o.len().min(32)]);
    buf.extend_from_slice(&p.to_le_bytes());
    buf.extend_from_slice(id0);
    if revision >= 4 && !encrypt_metadata {
        buf.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = Md5::digest(&buf).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_len]).to_vec();
        }
    }
    hash.truncate(key_len);
    hash
}

fn compute_u_r234(file_key: &[u8], id0: &[u8], revision: i64) -> Vec<u8> {
    if revision == 2 {
        rc4(file_key, &PAD)
    } else {
        let mut buf = PAD.to_vec();
        buf.extend_from_slice(id0);
        let hash = Md5::digest(&buf);
        let mut result = rc4(file_key, &hash);
        for i in 1u8..=19 {
            let xored: Vec<u8> = file_key.iter().map(|&b| b ^ i).collect();
            result = rc4(&xored, &result);
        }
        result.resize(32, 0);
        result
    }
}

fn compute_o_r234(owner_password: &[u8], user_password: &[u8], revision: i64, key_len: usize) -> Vec<u8> {
    let owner_padded = pad_password(owner_password);
    let mut hash = Md5::digest(owner_padded).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash).to_vec();
        }
    }
    let rc4_key = hash[..key_len].to_vec();
    let user_padded = pad_password(user_password);
    let mut result = rc4(&rc4_key, &user_padded);
    if revision >= 3 {
        for i in 1u8..=19 {
            let xored: Vec<u8> = rc4_key.iter().map(|&b| b ^ i).collect();
            result = rc4(&xored, &result);
        }
    }
    result
}

fn try_user_r234(password: &[u8], dict: &EncryptDict, id0: &[u8], key_len: usize) -> Option<Vec<u8>> {
    let key = compute_file_key_r234(password, &dict.o, dict.p, id0, key_len, dict.r, dict.encrypt_metadata);
    let candidate_u = compute_u_r234(&key, id0, dict.r);
    let matches = if dict.r == 2 {
        candidate_u == dict.u
    } else {
        candidate_u.len() >= 16 && dict.u.len() >= 16 && candidate_u[..16] == dict.u[..16]
    };
    matches.then_some(key)
}

fn try_owner_r234(password: &[u8], dict: &EncryptDict, id0: &[u8], key_len: usize) -> Option<Vec<u8>> {
    let owner_padded = pad_password(password);
    let mut hash = Md5::digest(owner_padded).to_vec();
    if dict.r >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash).to_vec();
        }
    }
    let rc4_key = hash[..key_len].to_vec();
    let mut recovered = dict.o.clone();
    recovered.resize(32, 0);
    if dict.r == 2 {
        recovered = rc4(&rc4_key, &recovered);
    } else {
        for i in (0..=19u8).rev() {
            let xored: Vec<u8> = rc4_key.iter().map(|&b| b ^ i).collect();
            recovered = rc4(&xored, &recovered);
        }
    }
    try_user_r234(&recovered, dict, id0, key_len)
}

// ---- R5-6 (AES-256) key schedule: PDF 32000-2 Algorithms 2.A/2.B/8-13 ----

/// Algorithm 2.B: the iterated hash used to turn a password + salt
/// (+ optionally the 48-byte `/U` entry, for the owner path) into a
/// 32-byte intermediate key. Runs at least 64 rounds of SHA-256/384/512
/// (selected by the previous round's ciphertext) until the terminating
/// byte condition is met.
fn algorithm_2b(password: &[u8], salt: &[u8], udata: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(password.len() + salt.len() + udata.len());
    input.extend_from_slice(password);
    input.extend_from_slice(salt);
    input.extend_from_slice(udata);
    let mut k = Sha256::digest(&input).to_vec();

    let mut round = 0u32;
    loop {
        let rep_len = password.len() + k.len() + udata.len();
        let mut k1 = Vec::with_capacity(rep_len * 64);
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(udata);
        }

        let e = aes128_cbc_no_padding(&k[0..16], &k[16..32], &k1);
        let modsum: u32 = e[0..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
        k = match modsum {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        if round >= 64 && (*e.last().unwrap() as u32) <= round.saturating_sub(32) {
            break;
        }
    }
    k.truncate(32);
    k
}

fn sha256_concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(a.len() + b.len());
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    Sha256::digest(&buf).to_vec()
}

fn sha256_concat3(a: &[u8], b: &[u8], c: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(a.len() + b.len() + c.len());
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    buf.extend_from_slice(c);
    Sha256::digest(&buf).to_vec()
}

fn try_user_r56(pw: &[u8], dict: &EncryptDict) -> Option<Vec<u8>> {
    if dict.u.len() < 48 {
        return None;
    }
    let validation_salt = &dict.u[32..40];
    let key_salt = &dict.u[40..48];
    let hash = if dict.r == 6 {
        algorithm_2b(pw, validation_salt, &[])
    } else {
        sha256_concat(pw, validation_salt)
    };
    if hash[..32] != dict.u[..32] {
        return None;
    }
    let intermediate = if dict.r == 6 {
        algorithm_2b(pw, key_salt, &[])
    } else {
        sha256_concat(pw, key_salt)
    };
    let ue = dict.ue.as_ref()?;
    if ue.len() != 32 {
        return None;
    }
    Some(aes256_cbc_decrypt_no_padding(&intermediate[..32], &[0u8; 16], ue))
}

fn try_owner_r56(pw: &[u8], dict: &EncryptDict) -> Option<Vec<u8>> {
    if dict.o.len() < 48 || dict.u.len() < 48 {
        return None;
    }
    let validation_salt = &dict.o[32..40];
    let key_salt = &dict.o[40..48];
    let hash = if dict.r == 6 {
        algorithm_2b(pw, validation_salt, &dict.u)
    } else {
        sha256_concat3(pw, validation_salt, &dict.u)
    };
    if hash[..32] != dict.o[..32] {
        return None;
    }
    let intermediate = if dict.r == 6 {
        algorithm_2b(pw, key_salt, &dict.u)
    } else {
        sha256_concat3(pw, key_salt, &dict.u)
    };
    let oe = dict.oe.as_ref()?;
    if oe.len() != 32 {
        return None;
    }
    Some(aes256_cbc_decrypt_no_padding(&intermediate[..32], &[0u8; 16], oe))
}

fn verify_perms(file_key: &[u8], dict: &EncryptDict) -> Result<()> {
    let perms = dict.perms.as_ref().ok_or(Error::Decryption(DecryptionError::PermsCheckFailed))?;
    if perms.len() != 16 {
        return Err(Error::Decryption(DecryptionError::PermsCheckFailed));
    }
    let decrypted = aes256_ecb_decrypt(file_key, perms);
    let p = i32::from_le_bytes(decrypted[0..4].try_into().unwrap());
    if p != dict.p {
        return Err(Error::Decryption(DecryptionError::PermsCheckFailed));
    }
    let metadata_flag = decrypted[8] == b'T';
    if metadata_flag != dict.encrypt_metadata || &decrypted[9..12] != b"adb" {
        return Err(Error::Decryption(DecryptionError::PermsCheckFailed));
    }
    Ok(())
}

// ---- encrypt dictionary parsing ----

struct EncryptDict {
    v: i64,
    r: i64,
    p: i32,
    length_bits: i64,
    o: Vec<u8>,
    u: Vec<u8>,
    oe: Option<Vec<u8>>,
    ue: Option<Vec<u8>>,
    perms: Option<Vec<u8>>,
    encrypt_metadata: bool,
    stmf: Vec<u8>,
    strf: Vec<u8>,
    cf: HashMap<Vec<u8>, EncryptMethod>,
}

fn resolve_encrypt_dict(document: &Document) -> Result<Dictionary> {
    let entry = document.trailer.get(b"Encrypt").map_err(|_| Error::Decryption(DecryptionError::InvalidEncryptDictionary))?;
    let dict = match entry {
        Object::Reference(id) => document
            .objects
            .get(id)
            .ok_or(Error::Decryption(DecryptionError::InvalidEncryptDictionary))?
            .as_dict()?,
        Object::Dictionary(d) => d,
        _ => return Err(Error::Decryption(DecryptionError::InvalidEncryptDictionary)),
    };
    Ok(dict.clone())
}

fn parse_encrypt_dict(document: &Document) -> Result<EncryptDict> {
    let dict = resolve_encrypt_dict(document)?;
    if let Ok(filter) = dict.get(b"Filter").and_then(Object::as_name) {
        if filter != b"Standard" {
            return Err(Error::Decryption(DecryptionError::InvalidEncryptDictionary));
        }
    }

    let v = dict.get(b"V").and_then(Object::as_i64).unwrap_or(1);
    let r = dict
        .get(b"R")
        .and_then(Object::as_i64)
        .map_err(|_| Error::Decryption(DecryptionError::InvalidEncryptDictionary))?;
    let p = dict.get(b"P").and_then(Object::as_i64).unwrap_or(0) as i32;
    let length_bits = dict.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
    let o = dict.get(b"O").and_then(Object::as_str).map(<[u8]>::to_vec).unwrap_or_default();
    let u = dict.get(b"U").and_then(Object::as_str).map(<[u8]>::to_vec).unwrap_or_default();
    let oe = dict.get(b"OE").and_then(Object::as_str).ok().map(<[u8]>::to_vec);
    let ue = dict.get(b"UE").and_then(Object::as_str).ok().map(<[u8]>::to_vec);
    let perms = dict.get(b"Perms").and_then(Object::as_str).ok().map(<[u8]>::to_vec);
    let encrypt_metadata = dict.get(b"EncryptMetadata").and_then(Object::as_bool).unwrap_or(true);

    let mut cf: HashMap<Vec<u8>, EncryptMethod> = HashMap::new();
    cf.insert(b"Identity".to_vec(), EncryptMethod::Identity);
    if let Ok(Object::Dictionary(cf_dict)) = dict.get(b"CF") {
        for (name, value) in cf_dict.iter() {
            if let Ok(filter_dict) = value.as_dict() {
                let method = match filter_dict.get(b"CFM").and_then(Object::as_name) {
                    Ok(b"V2") => EncryptMethod::Rc4,
                    Ok(b"AESV2") => EncryptMethod::AesV2,
                    Ok(b"AESV3") => EncryptMethod::AesV3,
                    _ => EncryptMethod::Identity,
                };
                cf.insert(name.clone(), method);
            }
        }
    }
    let stmf = dict.get(b"StmF").and_then(Object::as_name).map(<[u8]>::to_vec).unwrap_or_else(|_| b"Identity".to_vec());
    let strf = dict.get(b"StrF").and_then(Object::as_name).map(<[u8]>::to_vec).unwrap_or_else(|_| b"Identity".to_vec());

    Ok(EncryptDict {
        v,
        r,
        p,
        length_bits,
        o,
        u,
        oe,
        ue,
        perms,
        encrypt_metadata,
        stmf,
        strf,
        cf,
    })
}

fn trailer_id0(document: &Document) -> Vec<u8> {
    document
        .trailer
        .get(b"ID")
        .ok()
        .and_then(|o| o.as_array().ok())
        .and_then(|a| a.first())
        .and_then(|o| o.as_str().ok())
        .map(<[u8]>::to_vec)
        .unwrap_or_default()
}

/// Attempt authentication of `password`, returning the file key wrapped
/// in a usable [`EncryptionState`] plus the permission bits granted
/// (the dictionary's `/P` for a user match, every bit for an owner
/// match).
pub fn authenticate(document: &Document, password: &str) -> Result<(EncryptionState, Permissions)> {
    let dict = parse_encrypt_dict(document)?;
    let id0 = trailer_id0(document);
    let key_len_bytes = ((dict.length_bits / 8).max(5)) as usize;

    let (file_key, granted) = match dict.r {
        2 | 3 | 4 => {
            let pw = password.as_bytes();
            if let Some(key) = try_user_r234(pw, &dict, &id0, key_len_bytes) {
                (key, Permissions::from_bits_truncate(dict.p))
            } else if let Some(key) = try_owner_r234(pw, &dict, &id0, key_len_bytes) {
                (key, Permissions::owner())
            } else {
                return Err(Error::InvalidPassword);
            }
        }
        5 | 6 => {
            let pw = normalize_password(password);
            if let Some(key) = try_user_r56(&pw, &dict) {
                (key, Permissions::from_bits_truncate(dict.p))
            } else if let Some(key) = try_owner_r56(&pw, &dict) {
                (key, Permissions::owner())
            } else {
                return Err(Error::InvalidPassword);
            }
        }
        other => return Err(Error::Decryption(DecryptionError::UnsupportedRevision(other))),
    };

    if dict.r == 6 {
        verify_perms(&file_key, &dict)?;
    }

    let stream_method = if dict.v <= 2 {
        EncryptMethod::Rc4
    } else {
        *dict.cf.get(&dict.stmf).unwrap_or(&EncryptMethod::Identity)
    };
    let string_method = if dict.v <= 2 {
        EncryptMethod::Rc4
    } else {
        *dict.cf.get(&dict.strf).unwrap_or(&EncryptMethod::Identity)
    };

    Ok((
        EncryptionState {
            version: dict.v,
            revision: dict.r,
            file_key,
            key_length_bytes: key_len_bytes,
            stream_method,
            string_method,
            named_filters: dict.cf,
            encrypt_metadata: dict.encrypt_metadata,
        },
        granted,
    ))
}

/// The inverse of [`authenticate`]: produce fresh `/O`, `/U` (and, for
/// R>=5, `/OE`, `/UE`, `/Perms`) plus the file key, for a writer to
/// install into a new encryption dictionary.
pub struct GeneratedSecurity {
    pub version: i64,
    pub revision: i64,
    pub length_bits: i64,
    pub p: i32,
    pub o: Vec<u8>,
    pub u: Vec<u8>,
    pub oe: Option<Vec<u8>>,
    pub ue: Option<Vec<u8>>,
    pub perms: Option<Vec<u8>>,
    pub file_key: Vec<u8>,
}

pub fn generate_params(
    user_password: &str, owner_password: &str, revision: i64, permissions: Permissions, encrypt_metadata: bool, id0: &[u8],
) -> Result<GeneratedSecurity> {
    match revision {
        2 | 3 | 4 => Ok(generate_r234(user_password, owner_password, revision, permissions, encrypt_metadata, id0)),
        5 | 6 => Ok(generate_r56(user_password, owner_password, revision, permissions, encrypt_metadata)),
        other => Err(Error::Decryption(DecryptionError::UnsupportedRevision(other))),
    }
}

fn generate_r234(user_password: &str, owner_password: &str, r: i64, permissions: Permissions, encrypt_metadata: bool, id0: &[u8]) -> GeneratedSecurity {
    let key_len = if r == 2 { 5 } else { 16 };
    let p = permissions.bits();
    let o = compute_o_r234(owner_password.as_bytes(), user_password.as_bytes(), r, key_len);
    let file_key = compute_file_key_r234(user_password.as_bytes(), &o, p, id0, key_len, r, encrypt_metadata);
    let u = compute_u_r234(&file_key, id0, r);
    GeneratedSecurity {
        // R2 -> V1 (RC4-40), R3 -> V2 (RC4-128), R4 -> V4 (AES-128 via
        // the /CF crypt-filter mechanism) per the glossary's R->cipher
        // mapping; collapsing R3/R4 to the same V would silently encrypt
        // an R4 document with RC4 instead of AES-128.
        version: match r {
            2 => 1,
            3 => 2,
            _ => 4,
        },
        revision: r,
        length_bits: (key_len * 8) as i64,
        p,
        o,
        u,
        oe: None,
        ue: None,
        perms: None,
        file_key,
    }
}

fn generate_r56(user_password: &str, owner_password: &str, r: i64, permissions: Permissions, encrypt_metadata: bool) -> GeneratedSecurity {
    let file_key = random_bytes::<32>();

    let pw_u = normalize_password(user_password);
    let uvs = random_bytes::<8>();
    let uks = random_bytes::<8>();
    let hash_u = if r == 6 { algorithm_2b(&pw_u, &uvs, &[]) } else { sha256_concat(&pw_u, &uvs) };
    let mut u = Vec::with_capacity(48);
    u.extend_from_slice(&hash_u[..32]);
    u.extend_from_slice(&uvs);
    u.extend_from_slice(&uks);
    let inter_u = if r == 6 { algorithm_2b(&pw_u, &uks, &[]) } else { sha256_concat(&pw_u, &uks) };
    let ue = aes256_cbc_encrypt_no_padding(&inter_u[..32], &[0u8; 16], &file_key);

    let pw_o = normalize_password(owner_password);
    let ovs = random_bytes::<8>();
    let oks = random_bytes::<8>();
    let hash_o = if r == 6 {
        algorithm_2b(&pw_o, &ovs, &u)
    } else {
        sha256_concat3(&pw_o, &ovs, &u)
    };
    let mut o = Vec::with_capacity(48);
    o.extend_from_slice(&hash_o[..32]);
    o.extend_from_slice(&ovs);
    o.extend_from_slice(&oks);
    let inter_o = if r == 6 {
        algorithm_2b(&pw_o, &oks, &u)
    } else {
        sha256_concat3(&pw_o, &oks, &u)
    };
    let oe = aes256_cbc_encrypt_no_padding(&inter_o[..32], &[0u8; 16], &file_key);

    let perms = if r == 6 {
        let mut plain = [0u8; 16];
        plain[0..4].copy_from_slice(&permissions.bits().to_le_bytes());
        plain[4..8].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        plain[8] = if encrypt_metadata { b'T' } else { b'F' };
        plain[9..12].copy_from_slice(b"adb");
        plain[12..16].copy_from_slice(&random_bytes::<4>());
        Some(aes256_ecb_encrypt(&file_key, &plain))
    } else {
        None
    };

    GeneratedSecurity {
        version: 5,
        revision: r,
        length_bits: 256,
        p: permissions.bits(),
        o,
        u,
        oe: Some(oe),
        ue: Some(ue),
        perms,
        file_key: file_key.to_vec(),
    }
}

// ---- object/stream encrypt-decrypt traversal ----

/// Decrypt every string and stream reachable from `object` (the direct
/// body of indirect object `id`), using `id` for per-object key
/// derivation. The signature `/Contents` entry and `/Metadata` streams
/// when `EncryptMetadata` is false are left untouched; streams carrying
/// an explicit `/Crypt` filter stage are left for the filter pipeline
/// to resolve lazily against the correctly named filter.
pub fn decrypt_object(state: &EncryptionState, id: ObjectId, object: &mut Object) -> std::result::Result<(), DecryptionError> {
    transform_object(state, id, object, false)
}

/// The inverse of [`decrypt_object`], used by the writer's encrypt pass.
pub fn encrypt_object(state: &EncryptionState, id: ObjectId, object: &mut Object) -> std::result::Result<(), DecryptionError> {
    transform_object(state, id, object, true)
}

fn transform_object(state: &EncryptionState, id: ObjectId, object: &mut Object, encrypt: bool) -> std::result::Result<(), DecryptionError> {
    match object {
        Object::String(bytes, _) => {
            *bytes = state.transform(state.string_method, id, bytes, encrypt)?;
        }
        Object::Array(items) => {
            for item in items {
                transform_object(state, id, item, encrypt)?;
            }
        }
        Object::Dictionary(dict) => transform_dictionary(state, id, dict, encrypt)?,
        Object::Stream(stream) => {
            let exempt_metadata = stream.dict.type_is(b"Metadata") && !state.encrypt_metadata;
            let has_crypt_filter = filter_names_contain_crypt(&stream.dict);
            transform_dictionary(state, id, &mut stream.dict, encrypt)?;
            if !exempt_metadata && !has_crypt_filter {
                let transformed = state.transform(state.stream_method, id, &stream.content, encrypt)?;
                // AES-CBC ciphertext carries a 16-byte IV prefix plus
                // PKCS#5 padding, so it's never the same length as the
                // plaintext it replaces — `/Length` must be resynced,
                // not just the byte buffer swapped in place.
                stream.set_content(transformed);
            }
        }
        _ => {}
    }
    Ok(())
}

fn transform_dictionary(state: &EncryptionState, id: ObjectId, dict: &mut Dictionary, encrypt: bool) -> std::result::Result<(), DecryptionError> {
    let is_signature = dict.type_is(b"Sig");
    let keys: Vec<Vec<u8>> = dict.iter().map(|(k, _)| k.clone()).collect();
    for key in keys {
        if is_signature && key == b"Contents" {
            continue;
        }
        if let Ok(value) = dict.get_mut(&key) {
            transform_object(state, id, value, encrypt)?;
        }
    }
    Ok(())
}

fn filter_names_contain_crypt(dict: &Dictionary) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => n == b"Crypt",
        Ok(Object::Array(items)) => items.iter().any(|o| matches!(o, Object::Name(n) if n == b"Crypt")),
        _ => false,
    }
}

/// Resolve a `/Crypt` filter stage's `DecodeParms.Name` against the
/// document's named filters and decrypt `data` with it; this is how
/// the filter pipeline reaches the security handler (spec 4.3.5).
pub fn decrypt_stream_data(document: &Document, id: ObjectId, data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let state = document.encryption_state.as_ref().ok_or(Error::Decryption(DecryptionError::InvalidEncryptDictionary))?;
    let name = params.get(b"Name").and_then(Object::as_name).unwrap_or(b"Identity").to_vec();
    let method = state.named_filters.get(&name).copied().unwrap_or(EncryptMethod::Identity);
    state.transform(method, id, data, false).map_err(Error::Decryption)
}

// ---- AES primitives ----

fn aes128_encrypt(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let iv = random_bytes::<16>();
    let mut cipher = Aes128CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(&iv));
    let mut out = iv.to_vec();
    out.extend(cipher.encrypt_padded_vec_mut::<Pkcs5>(plaintext));
    out
}

fn aes128_decrypt(key: &[u8], data: &[u8]) -> std::result::Result<Vec<u8>, DecryptionError> {
    if data.len() < 16 {
        return Err(DecryptionError::InvalidCiphertextLength);
    }
    let (iv, ct) = data.split_at(16);
    if ct.is_empty() {
        return Ok(Vec::new());
    }
    if ct.len() % 16 != 0 {
        return Err(DecryptionError::InvalidCiphertextLength);
    }
    let mut cipher = Aes128CbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.decrypt_padded_vec_mut::<Pkcs5>(ct).map_err(|_| DecryptionError::InvalidPadding)
}

fn aes256_encrypt(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let iv = random_bytes::<16>();
    let mut cipher = Aes256CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(&iv));
    let mut out = iv.to_vec();
    out.extend(cipher.encrypt_padded_vec_mut::<Pkcs5>(plaintext));
    out
}

fn aes256_decrypt(key: &[u8], data: &[u8]) -> std::result::Result<Vec<u8>, DecryptionError> {
    if data.len() < 16 {
        return Err(DecryptionError::InvalidCiphertextLength);
    }
    let (iv, ct) = data.split_at(16);
    if ct.is_empty() {
        return Ok(Vec::new());
    }
    if ct.len() % 16 != 0 {
        return Err(DecryptionError::InvalidCiphertextLength);
    }
    let mut cipher = Aes256CbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.decrypt_padded_vec_mut::<Pkcs5>(ct).map_err(|_| DecryptionError::InvalidPadding)
}

fn aes128_cbc_no_padding(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Aes128CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.encrypt_padded_vec_mut::<NoPadding>(data)
}

fn aes256_cbc_encrypt_no_padding(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Aes256CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.encrypt_padded_vec_mut::<NoPadding>(data)
}

fn aes256_cbc_decrypt_no_padding(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Aes256CbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    cipher.decrypt_padded_vec_mut::<NoPadding>(data).expect("exact block multiple")
}

fn aes256_ecb_encrypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Aes256EcbEnc::new(GenericArray::from_slice(key));
    cipher.encrypt_padded_vec_mut::<NoPadding>(data)
}

fn aes256_ecb_decrypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Aes256EcbDec::new(GenericArray::from_slice(key));
    cipher.decrypt_padded_vec_mut::<NoPadding>(data).expect("exact block multiple")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r234_user_then_owner_recover_same_key() {
        let id0 = b"some-file-id".to_vec();
        let gen = generate_r234("", "owner", 3, Permissions::from_bits_truncate(-4), true, &id0);
        let dict = EncryptDict {
            v: gen.version,
            r: gen.revision,
            p: gen.p,
            length_bits: gen.length_bits,
            o: gen.o.clone(),
            u: gen.u.clone(),
            oe: None,
            ue: None,
            perms: None,
            encrypt_metadata: true,
            stmf: b"Identity".to_vec(),
            strf: b"Identity".to_vec(),
            cf: HashMap::new(),
        };
        let key_len = (gen.length_bits / 8) as usize;

        let via_user = try_user_r234(b"", &dict, &id0, key_len).unwrap();
        let via_owner = try_owner_r234(b"owner", &dict, &id0, key_len).unwrap();
        assert_eq!(via_user, gen.file_key);
        assert_eq!(via_owner, gen.file_key);
    }

    #[test]
    fn r6_user_and_owner_recover_same_key_and_perms_round_trips() {
        let gen = generate_r56("user-pass", "owner-pass", 6, Permissions::from_bits_truncate(-4), true);
        let dict = EncryptDict {
            v: gen.version,
            r: gen.revision,
            p: gen.p,
            length_bits: gen.length_bits,
            o: gen.o.clone(),
            u: gen.u.clone(),
            oe: gen.oe.clone(),
            ue: gen.ue.clone(),
            perms: gen.perms.clone(),
            encrypt_metadata: true,
            stmf: b"StdCF".to_vec(),
            strf: b"StdCF".to_vec(),
            cf: HashMap::new(),
        };

        let via_user = try_user_r56(&normalize_password("user-pass"), &dict).unwrap();
        let via_owner = try_owner_r56(&normalize_password("owner-pass"), &dict).unwrap();
        assert_eq!(via_user, gen.file_key);
        assert_eq!(via_owner, gen.file_key);

        assert!(verify_perms(&gen.file_key, &dict).is_ok());
    }

    #[test]
    fn rc4_object_key_derivation_matches_known_shape() {
        let file_key = vec![1u8; 5];
        let key = derive_object_key(&file_key, (7, 0), false);
        assert_eq!(key.len(), (file_key.len() + 5).min(16));
    }

    #[test]
    fn aes_object_round_trip() {
        let state = EncryptionState {
            version: 4,
            revision: 4,
            file_key: random_bytes::<16>().to_vec(),
            key_length_bytes: 16,
            stream_method: EncryptMethod::AesV2,
            string_method: EncryptMethod::AesV2,
            named_filters: HashMap::new(),
            encrypt_metadata: true,
        };
        let plaintext = b"stream payload, still filter-encoded".to_vec();
        let ct = state.transform(EncryptMethod::AesV2, (3, 0), &plaintext, true).unwrap();
        let pt = state.transform(EncryptMethod::AesV2, (3, 0), &ct, false).unwrap();
        assert_eq!(pt, plaintext);
    }
}
