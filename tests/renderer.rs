mod support;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use support::{tile_color, write_map, Failure, MockEngine};
use tile_renderer::{
    ArgbBitmap, DataPolicy, DataStore, DatabaseRenderer, DisplayModel, Error, ErrorKind,
    RenderOptions, RendererConfig, RendererJob, ThemeState, Tile, TileCache, TileRenderer,
    TileSource,
};

fn world_map() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = write_map(dir.path(), "world.map");
    (dir, path)
}

#[test]
fn test_render_then_serve_from_cache() {
    let (_dir, path) = world_map();
    let engine = MockEngine::new();
    let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 64).unwrap();

    assert_eq!(ThemeState::Pending, renderer.theme_state());

    let first = renderer
        .render_tile(0, 0, 0)
        .expect("Unable to render the tile.")
        .expect("The tile should not be empty.");
    assert_eq!(256 * 256, first.len());
    assert_eq!(1, engine.renders());
    assert_eq!(ThemeState::Ready, renderer.theme_state());

    let second = renderer.render_tile(0, 0, 0).unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(1, engine.renders());
    assert_eq!(1, engine.compilations());
    assert_eq!(1, renderer.cache().stats().hits);
}

#[test]
fn test_opaque_argb_pixels() {
    let (_dir, path) = world_map();
    let renderer = TileRenderer::new(MockEngine::new(), &path, "default", 8).unwrap();

    let pixels = renderer.render_tile(4, 3, 5).unwrap().unwrap();
    let expected = 0xFF00_0000 | tile_color(Tile::new(3, 5, 4, 256));
    assert_eq!(pixels.iter().all(|p| *p == expected), true);
}

#[test]
fn test_empty_directory_renders_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = MockEngine::new();
    let renderer = TileRenderer::new(engine.clone(), dir.path(), "DEFAULT", 8).unwrap();

    assert_eq!(None, renderer.render_tile(5, 3, 7).unwrap());
    assert_eq!(1, engine.renders());
    // Empty tiles are not cached
    assert_eq!(renderer.cache().is_empty(), true);
}

#[test]
fn test_directory_becomes_merged_store() {
    let dir = TempDir::new().unwrap();
    write_map(dir.path(), "a.map");
    fs::write(dir.path().join("b.txt"), "readme").unwrap();
    write_map(dir.path(), "c.map");

    let renderer = TileRenderer::new(MockEngine::new(), dir.path(), "DEFAULT", 8).unwrap();
    let store = renderer.data_store().unwrap();

    match &*store {
        DataStore::Multi(multi) => {
            assert_eq!(DataPolicy::Deduplicate, multi.policy());
            let names: Vec<_> = multi
                .sources()
                .iter()
                .map(|s| s.map_file.path().file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            assert_eq!(vec!["a.map", "c.map"], names);
        }
        other => panic!("expected a merged store, got {:?}", other),
    }

    assert_eq!(renderer.render_tile(1, 0, 1).unwrap().is_some(), true);
}

#[test]
fn test_single_file_store() {
    let (_dir, path) = world_map();
    let renderer = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();

    match &*renderer.data_store().unwrap() {
        DataStore::Single(map_file) => assert_eq!(path.as_path(), map_file.path()),
        other => panic!("expected a single map file, got {:?}", other),
    }
}

#[test]
fn test_unknown_theme_fails_construction() {
    let (_dir, path) = world_map();

    match TileRenderer::new(MockEngine::new(), &path, "BOGUS", 8) {
        Err(err) => assert_eq!(ErrorKind::Configuration, err.kind()),
        Ok(_) => panic!("construction should fail for an unknown theme"),
    }

    // The theme is checked before the map path
    match TileRenderer::new(MockEngine::new(), "/data/world.map", "BOGUS", 8) {
        Err(Error::UnknownTheme(name)) => assert_eq!("BOGUS", name),
        Err(err) => panic!("expected an unknown theme error, got {}", err),
        Ok(_) => panic!("construction should fail for an unknown theme"),
    }
}

#[test]
fn test_bad_paths_are_io_errors() {
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "not a map").unwrap();

    for path in [dir.path().join("missing"), dir.path().join("missing.map"), notes] {
        match TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8) {
            Err(err) => assert_eq!(ErrorKind::Io, err.kind()),
            Ok(_) => panic!("construction should fail for {}", path.display()),
        }
    }
}

#[test]
fn test_malformed_map_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.map");
    fs::write(&path, [0u8; 64]).unwrap();

    match TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8) {
        Err(err) => assert_eq!(ErrorKind::Format, err.kind()),
        Ok(_) => panic!("construction should fail for a malformed map"),
    }
}

#[test]
fn test_zero_cache_capacity_is_rejected() {
    let (_dir, path) = world_map();

    match TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 0) {
        Err(err) => assert_eq!(ErrorKind::Configuration, err.kind()),
        Ok(_) => panic!("construction should fail for a zero capacity cache"),
    }
}

#[test]
fn test_concurrent_first_renders_compile_once() {
    let (_dir, path) = world_map();
    let engine = MockEngine {
        compile_delay: Duration::from_millis(50),
        ..MockEngine::new()
    };
    let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 8).unwrap();

    thread::scope(|scope| {
        let a = scope.spawn(|| renderer.render_tile(3, 1, 2));
        let b = scope.spawn(|| renderer.render_tile(3, 2, 1));

        assert_eq!(a.join().unwrap().unwrap().is_some(), true);
        assert_eq!(b.join().unwrap().unwrap().is_some(), true);
    });

    assert_eq!(1, engine.compilations());
    assert_eq!(2, engine.renders());
}

#[test]
fn test_many_renders_compile_once() {
    let (_dir, path) = world_map();
    let engine = MockEngine::new();
    let renderer = TileRenderer::new(engine.clone(), &path, "OSMARENDER", 4).unwrap();

    for x in 0..8 {
        renderer.render_tile(3, x, 0).unwrap();
    }

    assert_eq!(1, engine.compilations());
}

#[test]
fn test_theme_failure_is_sticky() {
    let (_dir, path) = world_map();
    let engine = MockEngine {
        broken_theme: true,
        ..MockEngine::new()
    };
    let renderer = TileRenderer::new(engine.clone(), &path, "BIKER", 8).unwrap();

    for _ in 0..3 {
        match renderer.render_tile(0, 0, 0) {
            Err(err) => assert_eq!(ErrorKind::Configuration, err.kind()),
            Ok(_) => panic!("a broken theme should fail every render"),
        }
    }

    assert_eq!(ThemeState::Failed, renderer.theme_state());
    assert_eq!(1, engine.compilations());
    assert_eq!(0, engine.renders());
}

#[test]
fn test_engine_errors_keep_their_kind() {
    let (_dir, path) = world_map();

    for (failure, kind) in [(Failure::Io, ErrorKind::Io), (Failure::Format, ErrorKind::Format)] {
        let engine = MockEngine {
            failure: Some(failure),
            ..MockEngine::new()
        };
        let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 8).unwrap();

        assert_eq!(kind, renderer.render_tile(2, 1, 1).unwrap_err().kind());
        // Failures are not cached, so the engine is asked again
        assert_eq!(kind, renderer.render_tile(2, 1, 1).unwrap_err().kind());
        assert_eq!(2, engine.renders());
    }
}

#[test]
fn test_closed_renderer() {
    let (_dir, path) = world_map();
    let renderer = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();
    renderer.render_tile(0, 0, 0).unwrap();

    renderer.close();
    assert_eq!(renderer.is_closed(), true);
    assert_eq!(renderer.cache().is_empty(), true);

    match renderer.render_tile(0, 0, 0) {
        Err(err) => assert_eq!(ErrorKind::State, err.kind()),
        Ok(_) => panic!("a closed renderer should not render"),
    }
    assert_eq!(ErrorKind::State, renderer.data_store().unwrap_err().kind());

    // Closing twice is harmless
    renderer.close();
}

#[test]
fn test_close_during_render_leaves_cache_empty() {
    let (_dir, path) = world_map();
    let engine = MockEngine {
        render_delay: Duration::from_millis(200),
        ..MockEngine::new()
    };
    let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 8).unwrap();

    thread::scope(|scope| {
        let render = scope.spawn(|| renderer.render_tile(0, 0, 0));
        thread::sleep(Duration::from_millis(50));
        renderer.close();

        // The render that was already running still completes
        assert_eq!(render.join().unwrap().unwrap().is_some(), true);
    });

    assert_eq!(renderer.is_closed(), true);
    assert_eq!(renderer.cache().is_empty(), true);
}

#[test]
fn test_wrong_size_bitmap_is_format_error() {
    let (_dir, path) = world_map();
    let engine = MockEngine {
        bitmap_size: Some(16),
        ..MockEngine::new()
    };
    let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 8).unwrap();

    match renderer.render_tile(0, 0, 0) {
        Err(err) => assert_eq!(ErrorKind::Format, err.kind()),
        Ok(pixels) => panic!(
            "expected a format error, got {:?} pixels",
            pixels.map(|p| p.len())
        ),
    }
    assert_eq!(renderer.cache().is_empty(), true);
}

#[test]
fn test_oversized_device_scale_is_rejected() {
    let (_dir, path) = world_map();
    let config = RendererConfig::new(&path, "DEFAULT").with_device_scale(1.0e9);

    match TileRenderer::from_config(MockEngine::new(), &config) {
        Err(err) => assert_eq!(ErrorKind::Configuration, err.kind()),
        Ok(renderer) => panic!(
            "construction should fail, got a {}px renderer",
            renderer.tile_size()
        ),
    }
}

#[test]
fn test_eviction_forces_a_rerender() {
    let (_dir, path) = world_map();
    let engine = MockEngine::new();
    let renderer = TileRenderer::new(engine.clone(), &path, "DEFAULT", 1).unwrap();

    let first = renderer.render_tile(2, 0, 0).unwrap();
    renderer.render_tile(2, 1, 0).unwrap();
    let again = renderer.render_tile(2, 0, 0).unwrap();

    assert_eq!(first, again);
    assert_eq!(3, engine.renders());
}

#[test]
fn test_separate_renderers_agree() {
    let (_dir, path) = world_map();
    let one = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();
    let two = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();

    assert_eq!(
        one.render_tile(7, 40, 90).unwrap(),
        two.render_tile(7, 40, 90).unwrap()
    );
}

#[test]
fn test_config_device_scale_is_per_renderer() {
    let (_dir, path) = world_map();
    let config = RendererConfig::new(&path, "DEFAULT")
        .with_device_scale(2.0)
        .with_text_scale(1.5);
    let hidpi = TileRenderer::from_config(MockEngine::new(), &config).unwrap();
    let plain = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();

    assert_eq!(512, hidpi.tile_size());
    assert_eq!(256, plain.tile_size());
    assert_eq!(512 * 512, hidpi.render_tile(10, 512, 340).unwrap().unwrap().len());
}

#[test]
fn test_tile_source_and_png() {
    let (_dir, path) = world_map();
    let renderer = TileRenderer::new(MockEngine::new(), &path, "DEFAULT", 8).unwrap();

    let source: &dyn TileSource = &renderer;
    assert_eq!(256, source.tile_size());
    assert_eq!(
        Some(256 * 256),
        source.render_tile(1, 1, 1).unwrap().map(|p| p.len())
    );

    let image = renderer.render_tile_image(1, 1, 1).unwrap().unwrap();
    let png = image.encode_png().unwrap();
    assert_eq!(&[0x89, b'P', b'N', b'G'], &png[..4]);
}

#[test]
fn test_database_renderer_fills_the_cache() {
    let dir = TempDir::new().unwrap();
    write_map(dir.path(), "a.map");
    let store = tile_renderer::open_data_store(dir.path()).unwrap();
    let empty = tile_renderer::open_data_store(TempDir::new().unwrap().path()).unwrap();

    let cache: Arc<TileCache<ArgbBitmap>> = Arc::new(TileCache::new(4).unwrap());
    let engine = MockEngine::new();
    let renderer = DatabaseRenderer::new(engine.clone(), Arc::clone(&cache), RenderOptions::default());

    let display = DisplayModel::with_device_scale(1.0).unwrap();
    let theme = support::MockTheme {
        name: String::from("DEFAULT"),
    };
    let tile = Tile::new(0, 0, 1, display.tile_size());

    let job = RendererJob::new(tile, &store, 1, &theme, &display);
    let bitmap = renderer.execute_job(&job).unwrap().unwrap();
    assert_eq!(
        Some(Arc::as_ptr(&bitmap)),
        cache.get(&job.key()).map(|b| Arc::as_ptr(&b))
    );

    let empty_job = RendererJob::new(tile, &empty, 1, &theme, &display);
    assert_eq!(renderer.execute_job(&empty_job).unwrap().is_none(), true);
    assert_eq!(cache.contains(&empty_job.key()), false);
    assert_eq!(1, cache.len());
}
