use phdrscope_core::{Class, ElfFile, Identification, ParseError, Segment};
use serde::Serialize;
use std::fmt;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Everything the CLI prints, built once from the decoded image.
#[derive(Debug, Serialize)]
pub struct Report {
    pub path: String,
    pub architecture: &'static str,
    pub class_code: u8,
    pub file_header: Option<FileHeaderReport>,
    pub segments: Vec<SegmentReport>,
    pub stopped: Option<StopReport>,
}

#[derive(Debug, Serialize)]
pub struct FileHeaderReport {
    pub format: &'static str,
    pub object_type: String,
    pub object_type_code: u16,
    pub machine: u16,
    pub entry_point: u64,
    pub program_header_count: u16,
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub index: u16,
    pub kind: String,
    pub type_code: u32,
    pub description: &'static str,
    pub flags: Option<Vec<&'static str>>,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
    pub interpreter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopReport {
    pub index: u16,
    pub message: String,
}

impl SegmentReport {
    fn from_segment(segment: &Segment<'_>) -> Self {
        let h = &segment.header;
        SegmentReport {
            index: segment.index,
            kind: segment.kind.to_string(),
            type_code: h.p_type,
            description: segment.kind.description(),
            flags: segment.flags.map(|f| f.labels()),
            offset: h.p_offset,
            vaddr: h.p_vaddr,
            paddr: h.p_paddr,
            filesz: h.p_filesz,
            memsz: h.p_memsz,
            align: h.p_align,
            interpreter: segment.interpreter.map(|i| i.to_string_lossy().into_owned()),
        }
    }
}

impl Report {
    pub fn build(path: &str, elf: &ElfFile<'_>) -> Self {
        let file_header = elf.header().map(|h| FileHeaderReport {
            format: h.format_name(),
            object_type: h.object_type().to_string(),
            object_type_code: h.object_type().code(),
            machine: h.machine(),
            entry_point: h.entry_point(),
            program_header_count: h.program_header_count(),
        });

        let table = elf.segment_table();
        let segments = table.segments.iter().map(SegmentReport::from_segment).collect();
        let stopped = table.stopped.map(|t| StopReport { index: t.index, message: t.error.to_string() });

        Report {
            path: path.to_string(),
            architecture: elf.class().name(),
            class_code: elf.class().code(),
            file_header,
            segments,
            stopped,
        }
    }

    pub fn architecture_line(&self) -> String {
        architecture_line(Class::from_code(self.class_code))
    }

    pub fn render_table(&self) -> String {
        if self.segments.is_empty() {
            return "No program headers decoded.".to_string();
        }

        let rows: Vec<SegmentRow> = self.segments.iter().map(SegmentRow::from).collect();
        Table::new(rows).with(Style::modern()).to_string()
    }
}

/// The line-oriented report: header summary, then one block per program header.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.architecture_line())?;

        let Some(header) = &self.file_header else {
            return writeln!(f, "File header not decoded: only 64-bit images are supported");
        };

        writeln!(f, "Object file type: {}", header.object_type)?;
        writeln!(f, "entry point virtual address: 0x{:x}", header.entry_point)?;
        writeln!(f, "Number of entries in program header table: {}", header.program_header_count)?;

        for segment in &self.segments {
            writeln!(f, "Program segment #{} header:", segment.index)?;
            writeln!(f, "  Segment kind: {}", segment.description)?;
            if let Some(flags) = &segment.flags {
                writeln!(f, "  flags: {}", flags.join("|"))?;
            }
            if let Some(interpreter) = &segment.interpreter {
                writeln!(f, "  interpreter: {interpreter}")?;
            }
        }
        Ok(())
    }
}

/// Architecture-only report. Needs nothing past the identification block.
#[derive(Debug, Serialize)]
pub struct ClassReport {
    pub path: String,
    pub architecture: &'static str,
    pub class_code: u8,
}

impl ClassReport {
    pub fn parse(path: &str, bytes: &[u8]) -> Result<Self, ParseError> {
        let class = Identification::parse(bytes)?.class;
        Ok(ClassReport { path: path.to_string(), architecture: class.name(), class_code: class.code() })
    }
}

impl fmt::Display for ClassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&architecture_line(Class::from_code(self.class_code)))
    }
}

fn architecture_line(class: Class) -> String {
    match class {
        Class::Unknown(_) => "Unknown architecture!".to_string(),
        known => format!("Elf file is built for {} architecture", known.name()),
    }
}

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "#")]
    index: u16,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "VirtAddr")]
    vaddr: String,
    #[tabled(rename = "FileSiz")]
    filesz: String,
    #[tabled(rename = "MemSiz")]
    memsz: String,
    #[tabled(rename = "Interpreter")]
    interpreter: String,
}

impl From<&SegmentReport> for SegmentRow {
    fn from(s: &SegmentReport) -> Self {
        SegmentRow {
            index: s.index,
            kind: s.kind.clone(),
            flags: s.flags.as_ref().map(|f| f.join("|")).unwrap_or_default(),
            offset: format!("0x{:x}", s.offset),
            vaddr: format!("0x{:x}", s.vaddr),
            filesz: format!("0x{:x}", s.filesz),
            memsz: format!("0x{:x}", s.memsz),
            interpreter: s
                .interpreter
                .as_deref()
                .map(|i| i.trim_end_matches('\0').to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(phdrs: &[(u32, u32, u64, u64)], payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(b"\x7fELF");
        bytes[4] = 2;
        bytes[5] = 1;
        bytes[16..18].copy_from_slice(&2u16.to_le_bytes());
        bytes[24..32].copy_from_slice(&0x401000u64.to_le_bytes());
        bytes[32..40].copy_from_slice(&64u64.to_le_bytes());
        bytes[54..56].copy_from_slice(&56u16.to_le_bytes());
        bytes[56..58].copy_from_slice(&(phdrs.len() as u16).to_le_bytes());
        for &(p_type, p_flags, p_offset, p_filesz) in phdrs {
            let mut entry = [0u8; 56];
            entry[0..4].copy_from_slice(&p_type.to_le_bytes());
            entry[4..8].copy_from_slice(&p_flags.to_le_bytes());
            entry[8..16].copy_from_slice(&p_offset.to_le_bytes());
            entry[32..40].copy_from_slice(&p_filesz.to_le_bytes());
            bytes.extend_from_slice(&entry);
        }
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn text_report_for_loadable_and_interpreter() {
        let bytes = image(&[(1, 0x5, 0, 0x100), (3, 0x4, 176, 13)], b"/lib64/ld.so\0");
        let elf = ElfFile::parse(&bytes).unwrap();
        let report = Report::build("a.out", &elf);

        let expected = "\
Elf file is built for 64-bit architecture
Object file type: executable file
entry point virtual address: 0x401000
Number of entries in program header table: 2
Program segment #0 header:
  Segment kind: [PT_LOAD] loadable segment
  flags: EXEC|READ
Program segment #1 header:
  Segment kind: [PT_INTERP] location and size of a null-terminated pathname to invoke as an interpreter
  interpreter: /lib64/ld.so\0
";
        assert_eq!(report.to_string(), expected);
        assert!(report.stopped.is_none());
    }

    #[test]
    fn truncated_table_keeps_partial_results() {
        let bytes = image(&[(1, 0x6, 0, 0), (3, 0x4, 0x8000, 13)], b"");
        let elf = ElfFile::parse(&bytes).unwrap();
        let report = Report::build("a.out", &elf);

        assert_eq!(report.segments.len(), 1);
        let stopped = report.stopped.as_ref().unwrap();
        assert_eq!(stopped.index, 1);
        assert!(stopped.message.starts_with("truncated input: interpreter path of program header #1"));
        assert!(report.to_string().ends_with("  flags: WRITE|READ\n"));
    }

    #[test]
    fn architecture_lines() {
        let mut bytes = image(&[], b"");
        bytes[4] = 1;
        let report = Report::build("x", &ElfFile::parse(&bytes).unwrap());
        assert_eq!(report.architecture_line(), "Elf file is built for 32-bit architecture");
        assert!(report.file_header.is_none());

        bytes[4] = 7;
        let report = Report::build("x", &ElfFile::parse(&bytes).unwrap());
        assert_eq!(report.architecture_line(), "Unknown architecture!");
        assert_eq!(report.architecture, "unknown");
    }

    #[test]
    fn table_lists_segments() {
        let bytes = image(&[(1, 0x5, 0, 0x100), (0x7000_0001, 0, 0, 0)], b"");
        let report = Report::build("x", &ElfFile::parse(&bytes).unwrap());
        let table = report.render_table();
        assert!(table.contains("LOAD"));
        assert!(table.contains("EXEC|READ"));
        assert!(table.contains("LOPROC+0x1"));
    }

    #[test]
    fn json_shape() {
        let bytes = image(&[(1, 0x7, 0, 0)], b"");
        let report = Report::build("x", &ElfFile::parse(&bytes).unwrap());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["architecture"], "64-bit");
        assert_eq!(value["file_header"]["object_type"], "executable file");
        assert_eq!(value["segments"][0]["flags"], serde_json::json!(["EXEC", "WRITE", "READ"]));
        assert!(value["stopped"].is_null());
    }

    #[test]
    fn class_report_needs_only_identification() {
        let mut bytes = image(&[], b"");
        bytes.truncate(20);

        let report = ClassReport::parse("short", &bytes).unwrap();
        assert_eq!(report.to_string(), "Elf file is built for 64-bit architecture");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["architecture"], "64-bit");
        assert_eq!(value["class_code"], 2);
    }

    #[test]
    fn class_report_ignores_truncated_table() {
        let mut bytes = image(&[(1, 0x5, 0, 0)], b"");
        bytes[56..58].copy_from_slice(&3u16.to_le_bytes());

        let report = ClassReport::parse("x", &bytes).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["architecture"], "64-bit");
        assert!(value.get("segments").is_none());
        assert!(value.get("stopped").is_none());
    }

    #[test]
    fn class_report_still_rejects_bad_magic() {
        let mut bytes = image(&[], b"");
        bytes[0] = 0;
        assert!(matches!(
            ClassReport::parse("x", &bytes),
            Err(ParseError::InvalidMagic { .. })
        ));
    }
}
