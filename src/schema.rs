//! The Matroska/EBML DTD: a static table of every known element plus
//! the two derived lookup indices (`globalIDs`, `pathIDs`) and the
//! track-type map.
//!
//! The table is grounded in the per-element id/type listings of
//! `austinleroy-webm-iterable`'s `matroska_spec` module and
//! `hasenbanck-matroska-demuxer`'s `ID_TO_TYPE` map, using the classic
//! Matroska names (`TimecodeScale`/`Timecode`, not the WebM-era
//! `TimestampScale`/`Timestamp` renames).

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The payload type a schema entry decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A master element: holds other elements.
    Container,
    /// Unsigned integer.
    Uint,
    /// Signed integer.
    Int,
    /// IEEE float (4, 8, or 10 bytes).
    Float,
    /// UTF-8 string.
    String,
    /// Date: signed nanoseconds since 2001-01-01.
    Date,
    /// Raw binary.
    Binary,
}

/// A schema-declared default value, substituted for an empty payload.
#[derive(Debug, Clone, Copy)]
pub enum SchemaDefault {
    /// Default for `Uint`/`Date` elements.
    Uint(u64),
    /// Default for `Int` elements.
    Int(i64),
    /// Default for `String` elements.
    Str(&'static str),
}

/// A single DTD entry.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    /// Full slash-separated path from the pseudo-root, e.g.
    /// `"Segment/Cluster/BlockGroup/ReferenceBlock"`.
    pub path: &'static str,
    /// Numeric EBML identifier (marker bit included).
    pub id: u64,
    /// Declared payload type.
    pub kind: ElementKind,
    /// Whether more than one occurrence is valid under the same parent.
    pub multiple: bool,
    /// Whether this identifier is valid at any depth (CRC-32, Void, ...).
    pub global: bool,
    /// Whether the element may nest directly inside itself
    /// (ChapterAtom, SimpleTag).
    pub recursive: bool,
    /// Schema-declared default, substituted when the payload is empty.
    pub default: Option<SchemaDefault>,
}

impl SchemaEntry {
    /// The element's own name (the last path segment).
    pub fn name(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }

    /// The path of the element's parent, or `""` for a root-level entry.
    pub fn parent_path(&self) -> &'static str {
        match self.path.rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        }
    }
}

macro_rules! entry {
    ($path:literal, $id:expr, $kind:ident) => {
        entry!($path, $id, $kind, multiple: false, global: false, recursive: false, default: None)
    };
    ($path:literal, $id:expr, $kind:ident, multiple: $multiple:expr) => {
        entry!($path, $id, $kind, multiple: $multiple, global: false, recursive: false, default: None)
    };
    ($path:literal, $id:expr, $kind:ident, multiple: $multiple:expr, global: $global:expr, recursive: $recursive:expr, default: $default:expr) => {
        SchemaEntry {
            path: $path,
            id: $id,
            kind: ElementKind::$kind,
            multiple: $multiple,
            global: $global,
            recursive: $recursive,
            default: $default,
        }
    };
}

/// The full DTD, one entry per known element.
pub(crate) static ENTRIES: &[SchemaEntry] = &[
    // Global elements, valid at any depth.
    entry!("Crc32", 0xBF, Binary, multiple: false, global: true, recursive: false, default: None),
    entry!("Void", 0xEC, Binary, multiple: false, global: true, recursive: false, default: None),
    entry!("SignatureSlot", 0x1B53_8667, Container, multiple: true, global: true, recursive: false, default: None),
    entry!("SignatureSlot/SignatureAlgo", 0x7E8A, Uint),
    entry!("SignatureSlot/SignatureHash", 0x7E9A, Uint),
    entry!("SignatureSlot/SignaturePublicKey", 0x7EA5, Binary),
    entry!("SignatureSlot/Signature", 0x7EB5, Binary),
    entry!("SignatureSlot/SignatureElements", 0x7E5B, Container),
    entry!("SignatureSlot/SignatureElements/SignatureElementList", 0x7E7B, Container, multiple: true),
    entry!("SignatureSlot/SignatureElements/SignatureElementList/SignedElement", 0x6532, Binary, multiple: true),
    // EBML header.
    entry!("Ebml", 0x1A45_DFA3, Container),
    entry!("Ebml/EbmlVersion", 0x4286, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Ebml/EbmlReadVersion", 0x42F7, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Ebml/EbmlMaxIdLength", 0x42F2, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(4))),
    entry!("Ebml/EbmlMaxSizeLength", 0x42F3, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(8))),
    entry!("Ebml/DocType", 0x4282, String),
    entry!("Ebml/DocTypeVersion", 0x4287, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Ebml/DocTypeReadVersion", 0x4285, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Ebml/DocTypeExtension", 0x4281, Container, multiple: true),
    entry!("Ebml/DocTypeExtension/DocTypeExtensionName", 0x4283, String),
    entry!("Ebml/DocTypeExtension/DocTypeExtensionVersion", 0x4284, Uint),
    // Segment.
    entry!("Segment", 0x1853_8067, Container, multiple: true),
    // SeekHead.
    entry!("Segment/SeekHead", 0x114D_9B74, Container, multiple: true),
    entry!("Segment/SeekHead/Seek", 0x4DBB, Container, multiple: true),
    entry!("Segment/SeekHead/Seek/SeekID", 0x53AB, Binary),
    entry!("Segment/SeekHead/Seek/SeekPosition", 0x53AC, Uint),
    // Info.
    entry!("Segment/Info", 0x1549_A966, Container, multiple: true),
    entry!("Segment/Info/SegmentUID", 0x73A4, Binary),
    entry!("Segment/Info/SegmentFilename", 0x7384, String),
    entry!("Segment/Info/PrevUID", 0x3CB9_23, Binary),
    entry!("Segment/Info/PrevFilename", 0x3C83_AB, String),
    entry!("Segment/Info/NextUID", 0x3EB9_23, Binary),
    entry!("Segment/Info/NextFilename", 0x3E83_BB, String),
    entry!("Segment/Info/SegmentFamily", 0x4444, Binary, multiple: true),
    entry!("Segment/Info/ChapterTranslate", 0x6924, Container, multiple: true),
    entry!("Segment/Info/ChapterTranslate/ChapterTranslateEditionUID", 0x69FC, Uint, multiple: true),
    entry!("Segment/Info/ChapterTranslate/ChapterTranslateCodec", 0x69BF, Uint),
    entry!("Segment/Info/ChapterTranslate/ChapterTranslateID", 0x69A5, Binary),
    entry!("Segment/Info/TimecodeScale", 0x2AD7_B1, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1_000_000))),
    entry!("Segment/Info/Duration", 0x4489, Float),
    entry!("Segment/Info/DateUTC", 0x4461, Date),
    entry!("Segment/Info/Title", 0x7BA9, String),
    entry!("Segment/Info/MuxingApp", 0x4D80, String),
    entry!("Segment/Info/WritingApp", 0x5741, String),
    // Cluster.
    entry!("Segment/Cluster", 0x1F43_B675, Container, multiple: true),
    entry!("Segment/Cluster/Timecode", 0xE7, Uint),
    entry!("Segment/Cluster/SilentTracks", 0x5854, Container),
    entry!("Segment/Cluster/SilentTracks/SilentTrackNumber", 0x58D7, Uint, multiple: true),
    entry!("Segment/Cluster/Position", 0xA7, Uint),
    entry!("Segment/Cluster/PrevSize", 0xAB, Uint),
    entry!("Segment/Cluster/SimpleBlock", 0xA3, Binary, multiple: true),
    entry!("Segment/Cluster/BlockGroup", 0xA0, Container, multiple: true),
    entry!("Segment/Cluster/BlockGroup/Block", 0xA1, Binary),
    entry!("Segment/Cluster/BlockGroup/BlockVirtual", 0xA2, Binary),
    entry!("Segment/Cluster/BlockGroup/BlockAdditions", 0x75A1, Container),
    entry!("Segment/Cluster/BlockGroup/BlockAdditions/BlockMore", 0xA6, Container, multiple: true),
    entry!("Segment/Cluster/BlockGroup/BlockAdditions/BlockMore/BlockAddID", 0xEE, Uint),
    entry!("Segment/Cluster/BlockGroup/BlockAdditions/BlockMore/BlockAdditional", 0xA5, Binary),
    entry!("Segment/Cluster/BlockGroup/BlockDuration", 0x9B, Uint),
    entry!("Segment/Cluster/BlockGroup/ReferencePriority", 0xFA, Uint),
    entry!("Segment/Cluster/BlockGroup/ReferenceBlock", 0xFB, Int, multiple: true),
    entry!("Segment/Cluster/BlockGroup/ReferenceVirtual", 0xFD, Int),
    entry!("Segment/Cluster/BlockGroup/CodecState", 0xA4, Binary),
    entry!("Segment/Cluster/BlockGroup/DiscardPadding", 0x75A2, Int),
    entry!("Segment/Cluster/BlockGroup/Slices", 0x8E, Container),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice", 0xE8, Container, multiple: true),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice/LaceNumber", 0xCC, Uint),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice/FrameNumber", 0xCD, Uint),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice/BlockAdditionID", 0xCB, Uint),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice/Delay", 0xCE, Uint),
    entry!("Segment/Cluster/BlockGroup/Slices/TimeSlice/SliceDuration", 0xCF, Uint),
    entry!("Segment/Cluster/BlockGroup/ReferenceFrame", 0xC8, Container),
    entry!("Segment/Cluster/BlockGroup/ReferenceFrame/ReferenceOffset", 0xC9, Uint),
    entry!("Segment/Cluster/BlockGroup/ReferenceFrame/ReferenceTimestamp", 0xCA, Uint),
    entry!("Segment/Cluster/EncryptedBlock", 0xAF, Binary, multiple: true),
    // Tracks.
    entry!("Segment/Tracks", 0x1654_AE6B, Container, multiple: true),
    entry!("Segment/Tracks/TrackEntry", 0xAE, Container, multiple: true),
    entry!("Segment/Tracks/TrackEntry/TrackNumber", 0xD7, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackUID", 0x73C5, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackType", 0x83, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagEnabled", 0xB9, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tracks/TrackEntry/FlagDefault", 0x88, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tracks/TrackEntry/FlagForced", 0x55AA, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(0))),
    entry!("Segment/Tracks/TrackEntry/FlagHearingImpaired", 0x55AB, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagVisualImpaired", 0x55AC, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagTextDescriptions", 0x55AD, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagOriginal", 0x55AE, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagCommentary", 0x55AF, Uint),
    entry!("Segment/Tracks/TrackEntry/FlagLacing", 0x9C, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tracks/TrackEntry/MinCache", 0x6DE7, Uint),
    entry!("Segment/Tracks/TrackEntry/MaxCache", 0x6DF8, Uint),
    entry!("Segment/Tracks/TrackEntry/DefaultDuration", 0x23E3_83, Uint),
    entry!("Segment/Tracks/TrackEntry/DefaultDecodedFieldDuration", 0x234E_7A, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackTimecodeScale", 0x2331_4F, Float, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Int(1))),
    entry!("Segment/Tracks/TrackEntry/TrackOffset", 0x537F, Int),
    entry!("Segment/Tracks/TrackEntry/MaxBlockAdditionID", 0x55EE, Uint),
    entry!("Segment/Tracks/TrackEntry/Name", 0x536E, String),
    entry!("Segment/Tracks/TrackEntry/Language", 0x22B5_9C, String, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Str("eng"))),
    entry!("Segment/Tracks/TrackEntry/LanguageIETF", 0x22B5_9D, String),
    entry!("Segment/Tracks/TrackEntry/CodecID", 0x86, String),
    entry!("Segment/Tracks/TrackEntry/CodecPrivate", 0x63A2, Binary),
    entry!("Segment/Tracks/TrackEntry/CodecName", 0x2586_88, String),
    entry!("Segment/Tracks/TrackEntry/AttachmentLink", 0x7446, Uint),
    entry!("Segment/Tracks/TrackEntry/CodecDecodeAll", 0xAA, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackOverlay", 0x6FAB, Uint, multiple: true),
    entry!("Segment/Tracks/TrackEntry/CodecDelay", 0x56AA, Uint),
    entry!("Segment/Tracks/TrackEntry/SeekPreRoll", 0x56BB, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackTranslate", 0x6624, Container, multiple: true),
    entry!("Segment/Tracks/TrackEntry/TrackTranslate/TrackTranslateEditionUID", 0x66FC, Uint, multiple: true),
    entry!("Segment/Tracks/TrackEntry/TrackTranslate/TrackTranslateCodec", 0x66BF, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackTranslate/TrackTranslateTrackID", 0x66A5, Binary),
    entry!("Segment/Tracks/TrackEntry/Video", 0xE0, Container),
    entry!("Segment/Tracks/TrackEntry/Video/FlagInterlaced", 0x9A, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/FieldOrder", 0x9D, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/StereoMode", 0x53B8, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/AlphaMode", 0x53C0, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/OldStereoMode", 0x53B9, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelWidth", 0xB0, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelHeight", 0xBA, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelCropBottom", 0x54AA, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelCropTop", 0x54BB, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelCropLeft", 0x54CC, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/PixelCropRight", 0x54DD, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/DisplayWidth", 0x54B0, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/DisplayHeight", 0x54BA, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/DisplayUnit", 0x54B2, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/AspectRatioType", 0x54B3, Uint),
    entry!("Segment/Tracks/TrackEntry/Video/UncompressedFourCC", 0x2EB5_24, Binary),
    entry!("Segment/Tracks/TrackEntry/Video/GammaValue", 0x2FB5_23, Float),
    entry!("Segment/Tracks/TrackEntry/Video/FrameRate", 0x2383_E3, Float),
    entry!("Segment/Tracks/TrackEntry/Audio", 0xE1, Container),
    entry!("Segment/Tracks/TrackEntry/Audio/SamplingFrequency", 0xB5, Float, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Int(8000))),
    entry!("Segment/Tracks/TrackEntry/Audio/OutputSamplingFrequency", 0x78B5, Float),
    entry!("Segment/Tracks/TrackEntry/Audio/Channels", 0x9F, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tracks/TrackEntry/Audio/BitDepth", 0x6264, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackOperation", 0xE2, Container),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackCombinePlanes", 0xE3, Container),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackCombinePlanes/TrackPlane", 0xE4, Container, multiple: true),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackCombinePlanes/TrackPlane/TrackPlaneUID", 0xE5, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackCombinePlanes/TrackPlane/TrackPlaneType", 0xE6, Uint),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackJoinBlocks", 0xE9, Container),
    entry!("Segment/Tracks/TrackEntry/TrackOperation/TrackJoinBlocks/TrackJoinUID", 0xED, Uint, multiple: true),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings", 0x6D80, Container),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding", 0x6240, Container, multiple: true),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncodingOrder", 0x5031, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncodingScope", 0x5032, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncodingType", 0x5033, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentCompression", 0x5034, Container),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentCompression/ContentCompAlgo", 0x4254, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentCompression/ContentCompSettings", 0x4255, Binary),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption", 0x5035, Container),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentEncAlgo", 0x47E1, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentEncKeyID", 0x47E2, Binary),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentSigAlgo", 0x47E5, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentSigHashAlgo", 0x47E6, Uint),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentSigKeyID", 0x47E4, Binary),
    entry!("Segment/Tracks/TrackEntry/ContentEncodings/ContentEncoding/ContentEncryption/ContentSignature", 0x47E3, Binary),
    // Cues.
    entry!("Segment/Cues", 0x1C53_BB6B, Container, multiple: true),
    entry!("Segment/Cues/CuePoint", 0xBB, Container, multiple: true),
    entry!("Segment/Cues/CuePoint/CueTime", 0xB3, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions", 0xB7, Container, multiple: true),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueTrack", 0xF7, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueClusterPosition", 0xF1, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueRelativePosition", 0xF0, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueDuration", 0xB2, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueBlockNumber", 0x5378, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueCodecState", 0xEA, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueReference", 0xDB, Container, multiple: true),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueReference/CueRefTime", 0x96, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueReference/CueRefCluster", 0x97, Uint),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueReference/CueRefNumber", 0x535F, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Cues/CuePoint/CueTrackPositions/CueReference/CueRefCodecState", 0xEB, Uint),
    // Attachments.
    entry!("Segment/Attachments", 0x1941_A469, Container, multiple: true),
    entry!("Segment/Attachments/AttachedFile", 0x61A7, Container, multiple: true),
    entry!("Segment/Attachments/AttachedFile/FileDescription", 0x467E, String),
    entry!("Segment/Attachments/AttachedFile/FileName", 0x466E, String),
    entry!("Segment/Attachments/AttachedFile/FileMimeType", 0x4660, String),
    entry!("Segment/Attachments/AttachedFile/FileData", 0x465C, Binary),
    entry!("Segment/Attachments/AttachedFile/FileUID", 0x46AE, Uint),
    entry!("Segment/Attachments/AttachedFile/FileReferral", 0x4675, Binary),
    entry!("Segment/Attachments/AttachedFile/FileUsedStartTime", 0x4661, Uint),
    entry!("Segment/Attachments/AttachedFile/FileUsedEndTime", 0x4662, Uint),
    // Chapters.
    entry!("Segment/Chapters", 0x1043_A770, Container, multiple: true),
    entry!("Segment/Chapters/EditionEntry", 0x45B9, Container, multiple: true),
    entry!("Segment/Chapters/EditionEntry/EditionUID", 0x45BC, Uint),
    entry!("Segment/Chapters/EditionEntry/EditionFlagHidden", 0x45BD, Uint),
    entry!("Segment/Chapters/EditionEntry/EditionFlagDefault", 0x45DB, Uint),
    entry!("Segment/Chapters/EditionEntry/EditionFlagOrdered", 0x45DD, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom", 0xB6, Container, multiple: true, global: false, recursive: true, default: None),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterUID", 0x73C4, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterStringUID", 0x5654, String),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterTimeStart", 0x91, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterTimeEnd", 0x92, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterFlagHidden", 0x98, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterFlagEnabled", 0x4598, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterSegmentUID", 0x6E67, Binary),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterSegmentEditionUID", 0x6EBC, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterPhysicalEquiv", 0x63C3, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterTrack", 0x8F, Container),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterTrack/ChapterTrackUID", 0x89, Uint, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterDisplay", 0x80, Container, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterDisplay/ChapString", 0x85, String),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterDisplay/ChapLanguage", 0x437C, String, multiple: true, global: false, recursive: false, default: Some(SchemaDefault::Str("eng"))),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterDisplay/ChapLanguageIETF", 0x437D, String, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapterDisplay/ChapCountry", 0x437E, String, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess", 0x6944, Container, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess/ChapProcessCodecID", 0x6955, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(0))),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess/ChapProcessPrivate", 0x450D, Binary),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess/ChapProcessCommand", 0x6911, Container, multiple: true),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess/ChapProcessCommand/ChapProcessTime", 0x6922, Uint),
    entry!("Segment/Chapters/EditionEntry/ChapterAtom/ChapProcess/ChapProcessCommand/ChapProcessData", 0x6933, Binary),
    // Tags.
    entry!("Segment/Tags", 0x1254_C367, Container, multiple: true),
    entry!("Segment/Tags/Tag", 0x7373, Container, multiple: true),
    entry!("Segment/Tags/Tag/Targets", 0x63C0, Container),
    entry!("Segment/Tags/Tag/Targets/TargetTypeValue", 0x68CA, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(50))),
    entry!("Segment/Tags/Tag/Targets/TargetType", 0x63CA, String),
    entry!("Segment/Tags/Tag/Targets/TagTrackUID", 0x63C5, Uint, multiple: true, global: false, recursive: false, default: Some(SchemaDefault::Uint(0))),
    entry!("Segment/Tags/Tag/Targets/TagEditionUID", 0x63C9, Uint, multiple: true),
    entry!("Segment/Tags/Tag/Targets/TagChapterUID", 0x63C4, Uint, multiple: true),
    entry!("Segment/Tags/Tag/Targets/TagAttachmentUID", 0x63C6, Uint, multiple: true),
    entry!("Segment/Tags/Tag/SimpleTag", 0x67C8, Container, multiple: true, global: false, recursive: true, default: None),
    entry!("Segment/Tags/Tag/SimpleTag/TagName", 0x45A3, String),
    entry!("Segment/Tags/Tag/SimpleTag/TagLanguage", 0x447A, String, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Str("und"))),
    entry!("Segment/Tags/Tag/SimpleTag/TagLanguageIETF", 0x447B, String),
    entry!("Segment/Tags/Tag/SimpleTag/TagDefault", 0x4484, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tags/Tag/SimpleTag/TagDefaultBogus", 0x44B4, Uint, multiple: false, global: false, recursive: false, default: Some(SchemaDefault::Uint(1))),
    entry!("Segment/Tags/Tag/SimpleTag/TagString", 0x4487, String),
    entry!("Segment/Tags/Tag/SimpleTag/TagBinary", 0x4485, Binary),
];

static GLOBAL_IDS: Lazy<HashMap<u64, &'static SchemaEntry>> =
    Lazy::new(|| ENTRIES.iter().filter(|e| e.global).map(|e| (e.id, e)).collect());

static PATH_IDS: Lazy<HashMap<(&'static str, u64), &'static SchemaEntry>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .filter(|e| !e.global)
        .map(|e| ((e.parent_path(), e.id), e))
        .collect()
});

/// Symbolic track-type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// TrackType == 1
    Video,
    /// TrackType == 2
    Audio,
    /// TrackType == 0x10
    Logo,
    /// TrackType == 0x11
    Subtitle,
    /// TrackType == 0x12
    Buttons,
    /// TrackType == 0x20
    Control,
}

impl TrackKind {
    /// The container field name this kind's TrackEntry is bucketed under.
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
            TrackKind::Logo => "Logo",
            TrackKind::Subtitle => "Subtitle",
            TrackKind::Buttons => "Buttons",
            TrackKind::Control => "Control",
        }
    }
}

static TRACK_TYPES: Lazy<HashMap<u64, TrackKind>> = Lazy::new(|| {
    HashMap::from([
        (1, TrackKind::Video),
        (2, TrackKind::Audio),
        (0x10, TrackKind::Logo),
        (0x11, TrackKind::Subtitle),
        (0x12, TrackKind::Buttons),
        (0x20, TrackKind::Control),
    ])
});

/// Looks up the track kind for a raw `TrackType` value.
pub fn track_kind(raw: u64) -> Option<TrackKind> {
    TRACK_TYPES.get(&raw).copied()
}

/// Looks up a schema entry by its full declared path, e.g.
/// `"Segment/Cues"`.
pub fn entry_by_path(path: &str) -> Option<&'static SchemaEntry> {
    ENTRIES.iter().find(|e| e.path == path)
}

/// Resolves an identifier seen under `parent_path` to a schema entry.
///
/// Order: global table, exact path match, then ancestor paths (only
/// accepting a `recursive` entry found higher up the tree).
pub fn resolve(parent_path: &str, id: u64) -> Option<&'static SchemaEntry> {
    if let Some(entry) = GLOBAL_IDS.get(&id) {
        return Some(entry);
    }
    if let Some(entry) = PATH_IDS.get(&(parent_path, id)) {
        return Some(entry);
    }
    let mut ancestor = parent_path;
    while let Some((shorter, _)) = ancestor.rsplit_once('/') {
        ancestor = shorter;
        if let Some(entry) = PATH_IDS.get(&(ancestor, id)) {
            if entry.recursive {
                return Some(entry);
            }
        }
    }
    None
}
