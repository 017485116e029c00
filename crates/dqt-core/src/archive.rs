use std::io::{Read, Write};
use std::path::Path;

use tar::{Archive, Builder};

use crate::error::Error;
use crate::transpose::{TransposeOptions, transpose};

pub const DEFAULT_DOCKERFILE_NAME: &str = "Dockerfile";

/// Rewrite a tar build context: the entry matching `dockerfile_name` is
/// buffered, transposed, and re-appended under its original name; every
/// other entry streams through with its header preserved. Entries are
/// processed strictly in source order by a single writer.
///
/// On any `Err` the sink holds a partially written archive and must be
/// discarded by the caller.
pub fn transpose_tar_stream<R: Read, W: Write>(
    input: R,
    output: W,
    options: &TransposeOptions,
    dockerfile_name: &str,
) -> Result<(), Error> {
    let mut archive = Archive::new(input);
    let mut builder = Builder::new(output);
    let mut found = false;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if normalize_entry_name(&path) == dockerfile_name {
            // The transformation is not incremental, so the Dockerfile entry
            // is the one entry read fully into memory.
            let mut contents = String::new();
            entry.read_to_string(&mut contents)?;
            let transposed = transpose(&contents, options)?;

            let mut header = entry.header().clone();
            header.set_size(transposed.len() as u64);
            builder.append_data(&mut header, &path, transposed.as_bytes())?;
            found = true;
        } else {
            let mut header = entry.header().clone();
            builder.append_data(&mut header, &path, &mut entry)?;
        }
    }

    // Only caller-visible once the whole archive has been scanned.
    if !found {
        return Err(Error::missing_entry(dockerfile_name));
    }

    builder.finish()?;
    Ok(())
}

/// In-memory convenience over [`transpose_tar_stream`].
pub fn transpose_tar<R: Read>(
    input: R,
    options: &TransposeOptions,
    dockerfile_name: &str,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    transpose_tar_stream(input, &mut output, options, dockerfile_name)?;
    Ok(output)
}

/// Resolve `.`/`..` segments and rebase absolute-looking names so entry
/// names compare archive-relative.
fn normalize_entry_name(name: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in name.components() {
        match component {
            std::path::Component::Normal(part) => {
                parts.push(part.to_string_lossy().into_owned());
            }
            std::path::Component::ParentDir => {
                parts.pop();
            }
            std::path::Component::CurDir
            | std::path::Component::RootDir
            | std::path::Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}
