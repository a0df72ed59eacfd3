/// How a file's leading bytes are matched against its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Leading bytes must equal the magic number byte-for-byte
    Prefix(&'static [u8]),
    /// ISO-BMFF container: an `ftyp` box at offset 4 followed by the major brand at offset 8
    IsoBmffBrand(&'static [u8; 4]),
    /// Text markup: after an optional UTF-8 BOM and leading whitespace, one of
    /// the openings must follow (ASCII case-insensitive)
    Markup(&'static [&'static [u8]]),
}

impl SignatureCheck {
    const FTYP: &'static [u8; 4] = b"ftyp";
    const UTF8_BOM: &'static [u8] = &[0xEF, 0xBB, 0xBF];
    /// Leading whitespace tolerated before a markup opening
    const MARKUP_LEAD: usize = 256;

    /// Number of leading bytes needed to evaluate the check
    pub fn required_len(&self) -> usize {
        match self {
            SignatureCheck::Prefix(magic) => magic.len(),
            SignatureCheck::IsoBmffBrand(_) => 12,
            SignatureCheck::Markup(openings) => {
                Self::UTF8_BOM.len()
                    + Self::MARKUP_LEAD
                    + openings.iter().map(|o| o.len()).max().unwrap_or(0)
            }
        }
    }

    pub fn matches(&self, header: &[u8]) -> bool {
        match self {
            SignatureCheck::Prefix(magic) => header.starts_with(magic),
            SignatureCheck::IsoBmffBrand(brand) => {
                header.len() >= 12 && &header[4..8] == Self::FTYP && &header[8..12] == *brand
            }
            SignatureCheck::Markup(openings) => {
                let body = header.strip_prefix(Self::UTF8_BOM).unwrap_or(header);
                let body = body.trim_ascii_start();
                openings.iter().any(|opening| {
                    body.get(..opening.len())
                        .is_some_and(|lead| lead.eq_ignore_ascii_case(opening))
                })
            }
        }
    }
}

/// Registry entry describing one accepted upload type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeDescriptor {
    pub mime_type: &'static str,
    pub extensions: &'static [&'static str],
    pub signature: SignatureCheck,
    pub max_size: u64,
    pub scan_content: bool,
}

impl FileTypeDescriptor {
    /// Whether the (case-folded) file name ends with one of the registered extensions
    pub fn matches_extension(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext))
    }
}

const MB: u64 = 1024 * 1024;

static FILE_TYPES: &[FileTypeDescriptor] = &[
    FileTypeDescriptor {
        mime_type: "image/jpeg",
        extensions: &[".jpg", ".jpeg"],
        signature: SignatureCheck::Prefix(&[0xFF, 0xD8, 0xFF]),
        max_size: 10 * MB,
        scan_content: false,
    },
    FileTypeDescriptor {
        mime_type: "image/png",
        extensions: &[".png"],
        signature: SignatureCheck::Prefix(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        max_size: 10 * MB,
        scan_content: false,
    },
    FileTypeDescriptor {
        mime_type: "image/gif",
        extensions: &[".gif"],
        signature: SignatureCheck::Prefix(b"GIF8"),
        max_size: 5 * MB,
        scan_content: false,
    },
    FileTypeDescriptor {
        mime_type: "image/webp",
        extensions: &[".webp"],
        signature: SignatureCheck::Prefix(b"RIFF"),
        max_size: 10 * MB,
        scan_content: false,
    },
    FileTypeDescriptor {
        mime_type: "image/avif",
        extensions: &[".avif"],
        signature: SignatureCheck::IsoBmffBrand(b"avif"),
        max_size: 10 * MB,
        scan_content: false,
    },
    FileTypeDescriptor {
        mime_type: "image/svg+xml",
        extensions: &[".svg"],
        signature: SignatureCheck::Markup(&[b"<?xml", b"<svg"]),
        max_size: MB,
        scan_content: true,
    },
    FileTypeDescriptor {
        mime_type: "application/pdf",
        extensions: &[".pdf"],
        signature: SignatureCheck::Prefix(b"%PDF"),
        max_size: 25 * MB,
        scan_content: true,
    },
];

/// Types accepted by the previous upload policy; anything else only earns a warning
pub const LEGACY_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Strip MIME parameters and case-fold (`Image/PNG; q=1` -> `image/png`)
fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Look up the registry entry for a declared MIME type
pub fn descriptor_for(mime_type: &str) -> Option<&'static FileTypeDescriptor> {
    let normalized = normalize_mime(mime_type);
    FILE_TYPES.iter().find(|d| d.mime_type == normalized)
}

pub fn is_legacy_allowed_type(mime_type: &str) -> bool {
    LEGACY_ALLOWED_TYPES.contains(&normalize_mime(mime_type).as_str())
}

pub fn registered_mime_types() -> impl Iterator<Item = &'static str> {
    FILE_TYPES.iter().map(|d| d.mime_type)
}
