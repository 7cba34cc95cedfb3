// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Compression Pipeline Integration Tests
//!
//! The nested-decompression scenario end to end: a gzip of a tar of one
//! file, run through the standard pipeline.

use std::io::Write;
use tempfile::TempDir;

use chunkvault::infrastructure::pipeline::{keys, Pipeline, PipelineContext};

fn tar_with_file(name: &str, contents: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, contents).unwrap();
    builder.into_inner().unwrap()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// gzip(tar(hello.txt="hi")): the pipeline reports the outer gzip, the
/// nested tar, and a final artifact holding the tar expansion's bytes.
#[tokio::test]
async fn test_nested_gzip_tar_pipeline() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bundle.tar.gz");
    let tar_bytes = tar_with_file("hello.txt", b"hi");
    tokio::fs::write(&input, gzip(&tar_bytes)).await.unwrap();

    let mut ctx = PipelineContext::new(&input);
    Pipeline::standard().process(&mut ctx).await;

    assert!(!ctx.has_errors(), "errors: {:?}", ctx.errors());
    assert_eq!(ctx.text(keys::COMPRESSION_FORMAT), Some("gzip"));
    assert_eq!(ctx.text(keys::NESTED_COMPRESSION_FORMAT), Some("tar"));
    assert!(ctx.flag(keys::NESTED_COMPRESSION_PROCESSED));

    // The intermediate artifact is the tar archive itself.
    let decompressed = ctx.path(keys::DECOMPRESSED_URL).unwrap();
    assert_eq!(std::fs::read(decompressed).unwrap(), tar_bytes);

    // The final artifact is hello.txt's contents.
    let final_path = ctx.path(keys::FINAL_DECOMPRESSED_URL).unwrap();
    assert_eq!(std::fs::read(final_path).unwrap(), b"hi");
}

/// A bare gzip with plain contents stops after the first stage: no nested
/// format, no processed flag.
#[tokio::test]
async fn test_single_layer_gzip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt.gz");
    tokio::fs::write(&input, gzip(b"plain notes")).await.unwrap();

    let mut ctx = PipelineContext::new(&input);
    Pipeline::standard().process(&mut ctx).await;

    assert!(!ctx.has_errors());
    assert_eq!(ctx.text(keys::COMPRESSION_FORMAT), Some("gzip"));
    assert_eq!(ctx.text(keys::NESTED_COMPRESSION_FORMAT), None);
    assert!(!ctx.flag(keys::NESTED_COMPRESSION_PROCESSED));
}

/// Scratch artifacts disappear when the context goes out of scope,
/// whichever way the run ended.
#[tokio::test]
async fn test_scratch_cleanup_after_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bundle.tar.gz");
    tokio::fs::write(&input, gzip(&tar_with_file("hello.txt", b"hi")))
        .await
        .unwrap();

    let (decompressed, final_path) = {
        let mut ctx = PipelineContext::new(&input);
        Pipeline::standard().process(&mut ctx).await;
        (
            ctx.path(keys::DECOMPRESSED_URL).unwrap().to_path_buf(),
            ctx.path(keys::FINAL_DECOMPRESSED_URL).unwrap().to_path_buf(),
        )
    };

    assert!(!decompressed.exists());
    assert!(!final_path.exists());
}
