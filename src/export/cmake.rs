//! `CMakeLists.txt` registering the exported model with the KIM API build.

use std::fmt::{self, Write};

pub(super) fn render(
    model_name: &str,
    driver_name: &str,
    version: &str,
    files: &[&str],
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    out.push_str("#\n# Contributors:\n#    ann-forge\n#\n");
    writeln!(out, "# Parameter file format version {version}")?;
    out.push_str("#\n\n");
    out.push_str("cmake_minimum_required(VERSION 3.4)\n\n");
    out.push_str("list(APPEND CMAKE_PREFIX_PATH $ENV{KIM_API_CMAKE_PREFIX_DIR})\n");
    out.push_str("find_package(KIM-API 2.0 REQUIRED CONFIG)\n");
    out.push_str("if(NOT TARGET kim-api)\n");
    out.push_str("  enable_testing()\n");
    out.push_str("  project(\"${KIM_API_PROJECT_NAME}\" VERSION \"${KIM_API_VERSION}\"\n");
    out.push_str("    LANGUAGES CXX C Fortran)\n");
    out.push_str("endif()\n\n");
    out.push_str("add_kim_api_model_library(\n");
    writeln!(out, "  NAME            \"{model_name}\"")?;
    writeln!(out, "  DRIVER_NAME     \"{driver_name}\"")?;
    out.push_str("  PARAMETER_FILES");
    for file in files {
        write!(out, " \"{file}\"")?;
    }
    out.push_str("\n  )\n");
    Ok(out)
}
