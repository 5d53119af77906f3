use std::path::Path;

use crate::error::{Error, Result};
use crate::persona::{PersonaRecord, FLAT_COLUMNS};

/// File name of the batch index.
pub const INDEX_FILE_NAME: &str = "personas.csv";

/// One header row plus one flat row per persona.
pub fn write_index(path: &Path, personas: &[PersonaRecord]) -> Result<()> {
    let fail = |e: csv::Error| Error::export_failed("csv", format!("{}: {}", path.display(), e));

    let mut writer = csv::Writer::from_path(path).map_err(fail)?;
    writer.write_record(FLAT_COLUMNS).map_err(fail)?;
    for persona in personas {
        writer.write_record(persona.flat_row()).map_err(fail)?;
    }
    writer.flush().map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
