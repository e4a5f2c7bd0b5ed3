#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use asset::{ImportOptions, ImportedScene, SceneImporter};
use corelib::{AssetResult, ShaderStage};
use gpu::{
    BufferHandle, BufferKind, FilterMode, GpuDevice, PixelFormat, ProgramHandle, SharedDevice,
    StageHandle, TextureHandle, TextureUpload, WrapMode,
};
use image::ColorType;
use tempfile::TempDir;

/// Source marker that makes [`MockDevice::compile_stage`] fail.
pub const FAIL_COMPILE: &str = "#error";
/// Source marker that makes [`MockDevice::link_program`] fail.
pub const FAIL_LINK: &str = "#unresolved";

pub const VERTEX_SOURCE: &str = "fn vs_main() {}\n";
pub const FRAGMENT_SOURCE: &str = "fn fs_main() {}\n";

#[derive(Clone, Debug, PartialEq)]
pub struct TextureRecord {
    pub width: u32,
    pub height: u32,
    pub format: Option<PixelFormat>,
    pub mipmapped: bool,
    pub wrap: Option<(WrapMode, WrapMode)>,
    pub filter: Option<(FilterMode, FilterMode)>,
}

struct MockStage {
    source: String,
    log: String,
}

/// Bookkeeping stand-in for a GPU: tracks every live object and what was
/// uploaded to it.
#[derive(Default)]
pub struct MockDevice {
    next_id: u32,
    textures: HashMap<u32, TextureRecord>,
    stages: HashMap<u32, MockStage>,
    programs: HashMap<u32, (Vec<StageHandle>, String)>,
    buffers: HashMap<u32, (BufferKind, usize)>,
    pub textures_created: usize,
    pub stages_created: usize,
}

impl MockDevice {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureRecord> {
        self.textures.get(&handle.0)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_len(&self, handle: BufferHandle) -> Option<usize> {
        self.buffers.get(&handle.0).map(|(_, len)| *len)
    }
}

impl GpuDevice for MockDevice {
    fn create_texture(&mut self) -> TextureHandle {
        let id = self.allocate();
        self.textures_created += 1;
        self.textures.insert(
            id,
            TextureRecord {
                width: 0,
                height: 0,
                format: None,
                mipmapped: false,
                wrap: None,
                filter: None,
            },
        );
        TextureHandle(id)
    }

    fn upload_texture_2d(&mut self, texture: TextureHandle, upload: &TextureUpload<'_>) {
        let expected = (upload.width * upload.height) as usize * upload.format.channels() as usize;
        assert_eq!(upload.pixels.len(), expected, "tightly packed rows");
        let record = self.textures.get_mut(&texture.0).expect("upload to live texture");
        record.width = upload.width;
        record.height = upload.height;
        record.format = Some(upload.format);
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) {
        self.textures.get_mut(&texture.0).expect("live texture").mipmapped = true;
    }

    fn set_texture_wrap(&mut self, texture: TextureHandle, s: WrapMode, t: WrapMode) {
        self.textures.get_mut(&texture.0).expect("live texture").wrap = Some((s, t));
    }

    fn set_texture_filter(&mut self, texture: TextureHandle, min: FilterMode, mag: FilterMode) {
        self.textures.get_mut(&texture.0).expect("live texture").filter = Some((min, mag));
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        assert!(self.textures.remove(&texture.0).is_some(), "double delete");
    }

    fn create_stage(&mut self, _stage: ShaderStage) -> StageHandle {
        let id = self.allocate();
        self.stages_created += 1;
        self.stages.insert(
            id,
            MockStage {
                source: String::new(),
                log: String::new(),
            },
        );
        StageHandle(id)
    }

    fn compile_stage(&mut self, stage: StageHandle, source: &str) -> bool {
        let slot = self.stages.get_mut(&stage.0).expect("live stage");
        slot.source = source.to_owned();
        match source.lines().position(|line| line.contains(FAIL_COMPILE)) {
            Some(line) => {
                slot.log = format!("0:{}: error: unexpected '{FAIL_COMPILE}'", line + 1);
                false
            }
            None => true,
        }
    }

    fn stage_log(&self, stage: StageHandle) -> String {
        self.stages
            .get(&stage.0)
            .map(|slot| slot.log.clone())
            .unwrap_or_default()
    }

    fn delete_stage(&mut self, stage: StageHandle) {
        assert!(self.stages.remove(&stage.0).is_some(), "double delete");
    }

    fn create_program(&mut self) -> ProgramHandle {
        let id = self.allocate();
        self.programs.insert(id, (Vec::new(), String::new()));
        ProgramHandle(id)
    }

    fn attach_stage(&mut self, program: ProgramHandle, stage: StageHandle) {
        self.programs.get_mut(&program.0).expect("live program").0.push(stage);
    }

    fn detach_stage(&mut self, program: ProgramHandle, stage: StageHandle) {
        self.programs
            .get_mut(&program.0)
            .expect("live program")
            .0
            .retain(|&attached| attached != stage);
    }

    fn link_program(&mut self, program: ProgramHandle) -> bool {
        let (attached, _) = &self.programs[&program.0];
        let unresolved = attached
            .iter()
            .any(|stage| self.stages[&stage.0].source.contains(FAIL_LINK));
        let log = if unresolved {
            format!("link error: symbol '{FAIL_LINK}' not found")
        } else {
            String::new()
        };
        let linked = log.is_empty();
        self.programs.get_mut(&program.0).expect("live program").1 = log;
        linked
    }

    fn program_log(&self, program: ProgramHandle) -> String {
        self.programs
            .get(&program.0)
            .map(|(_, log)| log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        assert!(self.programs.remove(&program.0).is_some(), "double delete");
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let id = self.allocate();
        self.buffers.insert(id, (kind, contents.len()));
        BufferHandle(id)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        assert!(self.buffers.remove(&buffer.0).is_some(), "double delete");
    }

    fn live_objects(&self) -> usize {
        self.textures.len() + self.stages.len() + self.programs.len() + self.buffers.len()
    }
}

/// The mock for inspection plus the same device as the registry sees it.
pub fn mock_device() -> (Rc<RefCell<MockDevice>>, SharedDevice) {
    let mock = Rc::new(RefCell::new(MockDevice::default()));
    let shared: SharedDevice = mock.clone();
    (mock, shared)
}

/// Wraps another importer and counts how often it runs.
pub struct CountingImporter<I> {
    inner: I,
    calls: Rc<Cell<usize>>,
}

impl<I: SceneImporter> CountingImporter<I> {
    pub fn new(inner: I) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                inner,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl<I: SceneImporter> SceneImporter for CountingImporter<I> {
    fn import(&self, path: &Path, options: ImportOptions) -> AssetResult<ImportedScene> {
        self.calls.set(self.calls.get() + 1);
        self.inner.import(path, options)
    }
}

/// Returns the same in-memory scene for any path.
pub struct FixedScene(pub ImportedScene);

impl SceneImporter for FixedScene {
    fn import(&self, _path: &Path, _options: ImportOptions) -> AssetResult<ImportedScene> {
        Ok(self.0.clone())
    }
}

/// A throwaway asset root.
pub struct AssetTree {
    dir: TempDir,
}

impl AssetTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Solid-colour PNG with `channels` channels (1 to 4).
    pub fn write_png(&self, relative: &str, width: u32, height: u32, channels: u8) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        let color = match channels {
            1 => ColorType::L8,
            2 => ColorType::La8,
            3 => ColorType::Rgb8,
            _ => ColorType::Rgba8,
        };
        let pixels = vec![200u8; (width * height) as usize * channels as usize];
        image::save_buffer(&path, &pixels, width, height, color).expect("write png");
        path
    }

    /// Sources for every shader in `keys`, all of which compile and link.
    pub fn write_shaders(&self, keys: &[corelib::ShaderKey]) {
        for key in keys {
            let (vertex, fragment) = key.sources();
            self.write(vertex, VERTEX_SOURCE);
            self.write(fragment, FRAGMENT_SOURCE);
        }
    }

    /// `models/ball.obj`: two triangles whose materials share `shared.png`.
    pub fn write_ball(&self) {
        self.write("models/ball.obj", BALL_OBJ);
        self.write("models/ball.mtl", BALL_MTL);
        self.write_png("models/shared.png", 4, 4, 3);
        self.write_png("models/shine.png", 2, 2, 1);
    }

    /// `models/maze.obj`: one untextured quad.
    pub fn write_maze(&self) {
        self.write("models/maze.obj", MAZE_OBJ);
    }
}

// tobj does not trim `mtllib`/`o` lines, so fixture lines start at column 0.
pub const BALL_OBJ: &str = "mtllib ball.mtl
o upper
v -1.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 2.0 0.5
v -1.0 0.0 0.0
v 0.0 -3.0 -0.5
v 1.0 0.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.5 1.0
vn 0.0 0.0 1.0
usemtl red
f 1/1/1 2/2/1 3/3/1
o lower
usemtl blue
f 4/1/1 5/2/1 6/3/1
";

pub const BALL_MTL: &str = "newmtl red
Kd 1.0 0.0 0.0
map_Kd shared.png
map_Ks shine.png

newmtl blue
Kd 0.0 0.0 1.0
map_Kd shared.png
";

pub const MAZE_OBJ: &str = "o floor
v 0.0 0.0 0.0
v 4.0 0.0 0.0
v 4.0 0.0 4.0
v 0.0 0.0 4.0
f 1 2 3 4
";
