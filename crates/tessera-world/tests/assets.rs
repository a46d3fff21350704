use std::path::PathBuf;

use tessera_blocks::{BlockMode, BlockRegistry, CellValue};
use tessera_geom::ChunkCoord;
use tessera_world::{WorldConfig, WorldGen};

fn config() -> WorldConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/world.toml");
    WorldConfig::load_from_path(path).unwrap()
}

#[test]
fn shipped_documents_load() {
    let cfg = config();
    let wg = WorldGen::from_config(&cfg).unwrap();
    assert_eq!(wg.seed(), 1337);
    assert!(!wg.rules().is_empty());
    for name in wg.rules().referenced_types() {
        assert!(wg.spec(name).is_some(), "rules name missing type {name}");
    }
    let reg = BlockRegistry::load_from_path(cfg.blocks.as_ref().unwrap()).unwrap();
    assert_eq!(reg.mode_of("water"), BlockMode::Liquid);
    assert_eq!(reg.mode_of("planks"), BlockMode::Platform);
    assert!(reg.texture_of("gold").is_none());
}

#[test]
fn shipped_world_layers() {
    let cfg = config();
    let wg = WorldGen::from_config(&cfg).unwrap();
    let reg = BlockRegistry::load_from_path(cfg.blocks.as_ref().unwrap()).unwrap();
    for cx in -4..4 {
        assert!(wg.generate(ChunkCoord::new(cx, -1)).is_all_empty());
        let surface = wg.generate(ChunkCoord::new(cx, 0));
        match wg.chunk_type_for(ChunkCoord::new(cx, 0)) {
            Some("surface") => assert_eq!(surface.get_local(0, 6), Some(&CellValue::block("grass"))),
            Some("pond") => assert_eq!(surface.get_local(5, 8), Some(&CellValue::block("water"))),
            other => panic!("unexpected surface type {other:?}"),
        }
        for cy in 0..3 {
            let chunk = wg.generate(ChunkCoord::new(cx, cy));
            for cell in &chunk.cells {
                if let Some(id) = cell.id() {
                    assert!(id == "air" || reg.contains(id), "unregistered block {id}");
                }
            }
        }
    }
}
