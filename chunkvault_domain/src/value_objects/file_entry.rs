// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Entry Tree Node
//!
//! In-memory tree node used while building an archive. Directories own their
//! children through `Arc`; each child holds only a `Weak` back-reference to
//! its parent, so the whole tree's lifetime is tied to the root and dropping
//! the root drops everything. Walking up through `parent()` after the root
//! is gone simply yields `None`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use crate::ChunkError;

/// A node in the in-memory source tree.
///
/// Files carry a size; directories carry children. The parent link is weak:
/// the child never keeps the parent alive.
#[derive(Debug)]
pub struct FileEntry {
    name: String,
    size: Option<u64>,
    modified: Option<DateTime<Utc>>,
    file_type_id: Option<String>,
    parent: RwLock<Weak<FileEntry>>,
    children: Option<RwLock<Vec<Arc<FileEntry>>>>,
}

impl FileEntry {
    /// Creates a file node.
    pub fn new_file(
        name: impl Into<String>,
        size: u64,
        modified: Option<DateTime<Utc>>,
        file_type_id: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            size: Some(size),
            modified,
            file_type_id,
            parent: RwLock::new(Weak::new()),
            children: None,
        })
    }

    /// Creates a directory node with no children yet.
    pub fn new_directory(name: impl Into<String>, modified: Option<DateTime<Utc>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            size: None,
            modified,
            file_type_id: None,
            parent: RwLock::new(Weak::new()),
            children: Some(RwLock::new(Vec::new())),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes; `None` for directories.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn file_type_id(&self) -> Option<&str> {
        self.file_type_id.as_deref()
    }

    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }

    /// The parent directory, when it is still alive.
    pub fn parent(&self) -> Option<Arc<FileEntry>> {
        self.parent.read().upgrade()
    }

    /// Snapshot of the children; empty for files.
    pub fn children(&self) -> Vec<Arc<FileEntry>> {
        match &self.children {
            Some(children) => children.read().clone(),
            None => Vec::new(),
        }
    }

    /// Attaches `child` under the `parent` directory and wires the weak
    /// parent link.
    pub fn add_child(parent: &Arc<FileEntry>, child: Arc<FileEntry>) -> Result<(), ChunkError> {
        let children = parent.children.as_ref().ok_or_else(|| {
            ChunkError::InvalidStoragePath(format!("'{}' is not a directory", parent.name))
        })?;
        *child.parent.write() = Arc::downgrade(parent);
        children.write().push(child);
        Ok(())
    }

    /// Path from the tree root to this node, built by walking parent links.
    pub fn path(&self) -> PathBuf {
        let mut segments = vec![self.name.clone()];
        let mut current = self.parent();
        while let Some(node) = current {
            segments.push(node.name.clone());
            current = node.parent();
        }
        segments.iter().rev().collect()
    }

    /// Total size of this subtree (files only contribute).
    pub fn total_size(&self) -> u64 {
        match &self.children {
            None => self.size.unwrap_or(0),
            Some(children) => children.read().iter().map(|c| c.total_size()).sum(),
        }
    }
}
