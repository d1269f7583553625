//! Implementation of `weld new`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::toolchain::Toolset;
use crate::core::manifest::generate_manifest;
use crate::core::workspace::MANIFEST_NAME;
use crate::util::fs::write_string;

/// Kind of project to scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaffoldKind {
    #[default]
    ConsoleApp,
    SharedLib,
    StaticLib,
    Utility,
}

impl ScaffoldKind {
    /// The manifest `type` value.
    pub fn manifest_type(self) -> &'static str {
        match self {
            ScaffoldKind::ConsoleApp => "ConsoleApp",
            ScaffoldKind::SharedLib => "SharedLib",
            ScaffoldKind::StaticLib => "StaticLib",
            ScaffoldKind::Utility => "Utility",
        }
    }
}

/// Options for creating a new project.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Project name
    pub name: String,

    /// Compiler driver, `gcc` or `g++`
    pub toolset: String,

    /// Project kind
    pub kind: ScaffoldKind,
}

/// Create a new weld project at `path`.
///
/// Returns the source file written under `src/`.
pub fn new_project(path: &Path, opts: &NewOptions) -> Result<PathBuf> {
    let toolset = Toolset::for_project(&opts.toolset, &opts.name)?;

    if path.exists() {
        bail!("destination `{}` already exists", path.display());
    }

    let src_dir = path.join("src");
    let manifest = generate_manifest(&opts.name, opts.kind.manifest_type(), &opts.toolset);
    write_string(&path.join(MANIFEST_NAME), &manifest)?;

    let cpp = toolset == Toolset::Gxx;
    let (file_name, content) = match opts.kind {
        ScaffoldKind::ConsoleApp if cpp => ("main.cpp".to_string(), CPP_MAIN.to_string()),
        ScaffoldKind::ConsoleApp => ("main.c".to_string(), C_MAIN.to_string()),
        ScaffoldKind::SharedLib | ScaffoldKind::StaticLib => {
            let ext = if cpp { "cpp" } else { "c" };
            (format!("{}.{}", opts.name, ext), library_source(&opts.name))
        }
        ScaffoldKind::Utility => (format!("{}.h", opts.name), library_header(&opts.name)),
    };

    let source = src_dir.join(file_name);
    write_string(&source, &content)?;

    if matches!(opts.kind, ScaffoldKind::SharedLib | ScaffoldKind::StaticLib) {
        let header = src_dir.join(format!("{}.h", opts.name));
        write_string(&header, &library_header(&opts.name))?;
    }

    tracing::debug!("created `{}` at {}", opts.name, path.display());
    Ok(source)
}

const C_MAIN: &str = r#"#include <stdio.h>

int main(void) {
    printf("Hello, world!\n");
    return 0;
}
"#;

const CPP_MAIN: &str = r#"#include <iostream>

int main() {
    std::cout << "Hello, world!" << std::endl;
    return 0;
}
"#;

fn c_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn library_header(name: &str) -> String {
    let ident = c_identifier(name);
    let guard = ident.to_uppercase();
    format!(
        r#"#ifndef {guard}_H
#define {guard}_H

int {ident}_answer(void);

#endif
"#
    )
}

fn library_source(name: &str) -> String {
    let ident = c_identifier(name);
    format!(
        r#"#include "{name}.h"

int {ident}_answer(void) {{
    return 42;
}}
"#
    )
}
