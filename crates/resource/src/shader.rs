//! Shader Builder: vertex + fragment source pair to a linked program.
//!
//! Every intermediate object is an owning handle, so each failure path
//! (unreadable file, compile error, link error) releases whatever was created
//! before it returns. After a successful link the stages are detached and
//! dropped; only the program survives.

use std::{fs, path::Path};

use corelib::{AssetError, AssetResult, ShaderStage};
use gpu::{OwnedProgram, OwnedStage, ProgramHandle, SharedDevice};

use crate::primitive::PrimitiveGeometry;

/// A linked program, optionally with the geometry it draws.
#[derive(Debug)]
pub struct ShaderProgram {
    program: OwnedProgram,
    geometry: Option<PrimitiveGeometry>,
}

impl ShaderProgram {
    #[inline]
    pub fn program(&self) -> ProgramHandle {
        self.program.raw()
    }

    #[inline]
    pub fn geometry(&self) -> Option<&PrimitiveGeometry> {
        self.geometry.as_ref()
    }

    /// Attach buffers for a primitive-only program.
    pub fn with_geometry(mut self, geometry: PrimitiveGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

fn read_source(path: &Path) -> AssetResult<String> {
    fs::read_to_string(path).map_err(|source| {
        log::error!("couldn't open shader source {}: {source}", path.display());
        AssetError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Read both files, then compile and link them.
pub fn build_program(
    device: &SharedDevice,
    vertex_path: &Path,
    fragment_path: &Path,
) -> AssetResult<ShaderProgram> {
    let vertex_source = read_source(vertex_path)?;
    let fragment_source = read_source(fragment_path)?;
    build_program_from_sources(device, &vertex_source, &fragment_source)
}

pub fn build_program_from_sources(
    device: &SharedDevice,
    vertex_source: &str,
    fragment_source: &str,
) -> AssetResult<ShaderProgram> {
    let vertex = compile_stage(device, ShaderStage::Vertex, vertex_source)?;
    let fragment = compile_stage(device, ShaderStage::Fragment, fragment_source)?;
    let program = OwnedProgram::create(device);

    let link_log = {
        let mut gpu = device.borrow_mut();
        gpu.attach_stage(program.raw(), vertex.raw());
        gpu.attach_stage(program.raw(), fragment.raw());
        let linked = gpu.link_program(program.raw());
        let log = (!linked).then(|| gpu.program_log(program.raw()));
        gpu.detach_stage(program.raw(), vertex.raw());
        gpu.detach_stage(program.raw(), fragment.raw());
        log
    };

    if let Some(log) = link_log {
        log::error!("couldn't link program: {log}");
        return Err(AssetError::ShaderLink { log });
    }

    log::debug!("linked program {:?}", program);
    Ok(ShaderProgram {
        program,
        geometry: None,
    })
}

fn compile_stage(device: &SharedDevice, stage: ShaderStage, source: &str) -> AssetResult<OwnedStage> {
    let handle = OwnedStage::create(device, stage);

    let compile_log = {
        let mut gpu = device.borrow_mut();
        let compiled = gpu.compile_stage(handle.raw(), source);
        (!compiled).then(|| gpu.stage_log(handle.raw()))
    };

    match compile_log {
        None => Ok(handle),
        Some(log) => {
            log::error!("couldn't compile {stage} shader: {log}");
            Err(AssetError::ShaderCompile { stage, log })
        }
    }
}
