//! Loaders turning emissions spreadsheets and zipped CSV archives into a
//! [`Dataset`].
//!
//! Inputs come either from a path on disk or from an in-memory upload. The
//! input kind is inferred from the file extension unless the caller forces
//! one through [`LoadOptions::kind`].

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, Cursor},
    path::{Path, PathBuf},
    str::FromStr,
    time::Instant,
};

use emissions_core::{DEFAULT_TOP_N, Dataset};
use thiserror::Error;
use tracing::info;

pub mod archive;
pub mod spreadsheet;
pub mod timestamp;

pub use archive::MEMBER_SUFFIX;
pub use timestamp::parse_timestamp;

/// Year kept by the archive loader when none is configured.
pub const DEFAULT_TARGET_YEAR: i32 = 2024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Zip archive of per-source CSV files.
    Archive,
    /// Workbook with one sheet per `<category>-<source>` key.
    Spreadsheet,
}

impl InputKind {
    /// Infer the kind from a file name's extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(InputKind::Archive),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(InputKind::Spreadsheet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Archive => "archive",
            InputKind::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" | "zip" => Ok(InputKind::Archive),
            "spreadsheet" | "xlsx" | "workbook" => Ok(InputKind::Spreadsheet),
            other => Err(format!(
                "unknown input kind {other:?}; expected `archive` or `spreadsheet`"
            )),
        }
    }
}

/// Where the bytes of a load come from.
#[derive(Clone, Copy, Debug)]
pub enum Input<'a> {
    Path(&'a Path),
    /// User-supplied file; `name` is only used to infer the kind.
    Upload { name: &'a str, bytes: &'a [u8] },
}

impl Input<'_> {
    fn name(&self) -> String {
        match self {
            Input::Path(path) => path.display().to_string(),
            Input::Upload { name, .. } => (*name).to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Year kept when filtering archive rows.
    pub target_year: i32,
    /// Records kept per metric for archive layers.
    pub top_n: usize,
    /// Prefix stripped from archive member names before key extraction.
    pub archive_prefix: String,
    /// Force the input kind instead of inferring it from the extension.
    pub kind: Option<InputKind>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            target_year: DEFAULT_TARGET_YEAR,
            top_n: DEFAULT_TOP_N,
            archive_prefix: String::new(),
            kind: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot tell whether {name:?} is an archive or a spreadsheet")]
    UnsupportedInput { name: String },
    #[error("failed to read zip archive")]
    Archive(#[from] zip::result::ZipError),
    #[error("failed to parse CSV member {member:?}")]
    Csv {
        member: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to open workbook")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read sheet {sheet:?}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet {sheet:?} has no {column:?} column")]
    MissingColumn { sheet: String, column: &'static str },
}

/// Load a dataset from a path or an upload.
pub fn load_dataset(input: Input<'_>, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let name = input.name();
    let kind = options
        .kind
        .or_else(|| InputKind::from_name(&name))
        .ok_or_else(|| LoadError::UnsupportedInput { name: name.clone() })?;

    let started = Instant::now();
    let dataset = match (kind, input) {
        (InputKind::Archive, Input::Path(path)) => {
            let file = open(path)?;
            archive::load(BufReader::new(file), options)?
        }
        (InputKind::Archive, Input::Upload { bytes, .. }) => {
            archive::load(Cursor::new(bytes), options)?
        }
        (InputKind::Spreadsheet, Input::Path(path)) => {
            drop(open(path)?);
            spreadsheet::load(calamine::open_workbook_auto(path)?)?
        }
        (InputKind::Spreadsheet, Input::Upload { bytes, .. }) => {
            spreadsheet::load(calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?)?
        }
    };

    metrics::counter!("co2map_loads_total", "kind" => kind.as_str()).increment(1);
    info!(
        input = %name,
        %kind,
        layers = dataset.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "dataset loaded"
    );
    Ok(dataset)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
