use super::atom_info::{
	ATOM_HEADER_LEN, AtomInfo, EXTENDED_ATOM_HEADER_LEN, header_len, render_with, write_atom_size,
};
use super::offsets::{OffsetShift, check_offsets, update_offsets};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{ErrorKind, Result, TagError, truncated};
use crate::macros::{err, try_vec};
use crate::splice::{SpliceTarget, resize_bytes};
use crate::util::io::SeekStreamLen;

use std::io::{Cursor, Read, Seek, SeekFrom};

/// Atoms that are known to hold other atoms
///
/// Anything else is treated as an opaque leaf, even if its payload happens to look like atoms.
#[rustfmt::skip]
pub(crate) const CONTAINERS: &[[u8; 4]] = &[
	*b"moov",
		*b"udta",
			*b"meta",
				*b"ilst",
		*b"trak",
			*b"mdia",
				*b"minf",
					*b"stbl",
	*b"moof",
		*b"traf",
];

// Atoms that can directly follow the header of a non-full `meta` atom
const META_CHILDREN: &[[u8; 4]] = &[*b"hdlr", *b"ilst", *b"mhdr", *b"ctry", *b"lang"];

const MAX_DEPTH: usize = 32;

/// A handle to an atom within an [`AtomTree`]
///
/// Handles stay valid across mutations, except for those of atoms that were removed or that lived
/// inside of a replaced atom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(usize);

/// A single atom within an [`AtomTree`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomNode {
	ident: [u8; 4],
	position: u64,
	size: u64,
	extended: bool,
	// Bytes between the header and the first child (`meta` version and flags)
	skip: u64,
	parent: Option<AtomId>,
	children: Option<Vec<AtomId>>,
	removed: bool,
}

impl AtomNode {
	/// The atom's identifier
	pub fn ident(&self) -> [u8; 4] {
		self.ident
	}

	/// The offset of the atom's length field
	pub fn position(&self) -> u64 {
		self.position
	}

	/// The total size of the atom, including its header
	pub fn size(&self) -> u64 {
		self.size
	}

	/// Whether the atom uses a 64-bit header
	pub fn is_extended(&self) -> bool {
		self.extended
	}

	/// The size of the atom's header, either 8 or 16 bytes
	pub fn header_size(&self) -> u64 {
		header_len(self.extended)
	}

	/// The offset of the atom's payload
	pub fn data_offset(&self) -> u64 {
		self.position + self.header_size()
	}

	/// The size of the atom's payload
	pub fn payload_len(&self) -> u64 {
		self.size - self.header_size()
	}

	/// One past the last byte of the atom
	pub fn end(&self) -> u64 {
		self.position + self.size
	}

	/// The atom's parent, `None` for top level atoms
	pub fn parent(&self) -> Option<AtomId> {
		self.parent
	}

	/// The atom's children, `None` if it is not a known container
	pub fn children(&self) -> Option<&[AtomId]> {
		self.children.as_deref()
	}

	/// Whether the atom's children were parsed
	pub fn is_container(&self) -> bool {
		self.children.is_some()
	}

	fn children_start(&self) -> u64 {
		self.data_offset() + self.skip
	}
}

/// A tree of the atoms in an MP4 file
///
/// The tree is built once from a single scan over the file. Every atom lives in one arena and
/// refers to its parent by [`AtomId`].
///
/// Mutations ([`AtomTree::replace`], [`AtomTree::insert_child`], [`AtomTree::remove`]) resize the
/// file in place and then:
///
/// 1. Rewrite the size of every ancestor of the changed region, in place
/// 2. Shift the positions of every atom after the changed region
/// 3. Shift any chunk offsets (`stco`, `co64`, `tfhd`) that point at or after the changed region
///
/// Every size and offset is checked before the file is touched, so a failed mutation leaves the
/// file as it was (barring I/O errors). Chunk offset tables within the newly written bytes are
/// written as given.
#[derive(Clone, Debug)]
pub struct AtomTree {
	nodes: Vec<AtomNode>,
	roots: Vec<AtomId>,
	file_len: u64,
	parse_options: ParseOptions,
}

impl AtomTree {
	/// Parse the atoms of a file
	///
	/// Only the children of known containers are parsed. Trailing bytes that can't hold an atom
	/// after the last top level atom are ignored.
	///
	/// # Errors
	///
	/// * [`ErrorKind::TruncatedHeader`] if an atom header is cut off
	/// * [`ErrorKind::SizeMismatch`] if an atom claims more bytes than its parent (or the file) has
	///   * Top level atoms are tolerated unless [`ParsingMode::Strict`] is used
	///   * Nested atoms are only tolerated with [`ParsingMode::Relaxed`]
	/// * [`ErrorKind::BadAtom`] if an atom has an invalid length
	/// * [`std::io::Error`]
	pub fn read_from<R>(reader: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		let file_len = reader.stream_len_hack()?;

		let mut tree = Self {
			nodes: Vec::new(),
			roots: Vec::new(),
			file_len,
			parse_options,
		};

		tree.roots = tree.parse_region(reader, None, 0, file_len, 0)?;

		log::debug!(
			"MP4: Parsed {} atoms, {} at the top level",
			tree.nodes.len(),
			tree.roots.len()
		);

		Ok(tree)
	}

	fn parse_region<R>(
		&mut self,
		reader: &mut R,
		parent: Option<AtomId>,
		start: u64,
		end: u64,
		depth: usize,
	) -> Result<Vec<AtomId>>
	where
		R: Read + Seek,
	{
		if depth > MAX_DEPTH {
			err!(BadAtom("Atoms are nested too deeply"));
		}

		let parsing_mode = self.parse_options.parsing_mode;
		let top_level = parent.is_none();

		let mut ids = Vec::new();
		let mut pos = start;
		while pos < end {
			let remaining = end - pos;
			if remaining < ATOM_HEADER_LEN {
				if !top_level && parsing_mode == ParsingMode::Strict {
					err!(BadAtom("Unable to read entire container"));
				}

				log::warn!("MP4: Ignoring {remaining} trailing bytes at offset {pos}");
				break;
			}

			reader.seek(SeekFrom::Start(pos))?;
			let info = match AtomInfo::read(reader, remaining, top_level) {
				Ok(info) => info,
				Err(e) if matches!(e.kind(), ErrorKind::SizeMismatch) => {
					let tolerated = if top_level {
						parsing_mode != ParsingMode::Strict
					} else {
						parsing_mode == ParsingMode::Relaxed
					};

					if !tolerated {
						return Err(e);
					}

					log::warn!("MP4: Encountered an atom with an invalid length at {pos}, stopping");
					break;
				},
				Err(e) => return Err(e),
			};

			log::trace!(
				"MP4: Found atom {:?} at {pos}, size: {}",
				String::from_utf8_lossy(&info.ident),
				info.len
			);

			let id = self.push_node(info, parent);
			if CONTAINERS.contains(&info.ident) {
				self.parse_children(reader, id, depth)?;
			}

			ids.push(id);
			pos += info.len;
		}

		Ok(ids)
	}

	fn push_node(&mut self, info: AtomInfo, parent: Option<AtomId>) -> AtomId {
		let id = AtomId(self.nodes.len());
		self.nodes.push(AtomNode {
			ident: info.ident,
			position: info.start,
			size: info.len,
			extended: info.extended,
			skip: 0,
			parent,
			children: None,
			removed: false,
		});

		id
	}

	fn parse_children<R>(&mut self, reader: &mut R, id: AtomId, depth: usize) -> Result<()>
	where
		R: Read + Seek,
	{
		let node = &self.nodes[id.0];
		let (data_offset, payload_len, end) = (node.data_offset(), node.payload_len(), node.end());

		let skip = if node.ident == *b"meta" {
			meta_skip(reader, data_offset, payload_len)?
		} else {
			0
		};

		self.nodes[id.0].skip = skip;
		let children_start = self.nodes[id.0].children_start();
		let children = self.parse_region(reader, Some(id), children_start, end, depth + 1)?;
		self.nodes[id.0].children = Some(children);

		Ok(())
	}

	/// Get an atom by its [`AtomId`]
	///
	/// Returns `None` if the atom was removed.
	pub fn get(&self, id: AtomId) -> Option<&AtomNode> {
		self.nodes.get(id.0).filter(|node| !node.removed)
	}

	fn node(&self, id: AtomId) -> Result<&AtomNode> {
		self.get(id)
			.ok_or_else(|| TagError::new(ErrorKind::InvalidArgument("unknown atom")))
	}

	/// The top level atoms, in file order
	pub fn roots(&self) -> &[AtomId] {
		&self.roots
	}

	/// The length of the file, as of the last parse or mutation
	pub fn file_len(&self) -> u64 {
		self.file_len
	}

	/// The children of an atom, empty for leaves
	pub fn children(&self, id: AtomId) -> &[AtomId] {
		self.get(id).and_then(AtomNode::children).unwrap_or_default()
	}

	/// The parent of an atom
	pub fn parent(&self, id: AtomId) -> Option<AtomId> {
		self.get(id).and_then(AtomNode::parent)
	}

	/// The chain of atoms from the top level down to `id` (inclusive)
	pub fn path_to(&self, id: AtomId) -> Vec<AtomId> {
		let mut path = Vec::new();

		let mut current = self.get(id).map(|_| id);
		while let Some(id) = current {
			path.push(id);
			current = self.nodes[id.0].parent;
		}

		path.reverse();
		path
	}

	fn depth_of(&self, id: AtomId) -> usize {
		self.path_to(id).len().saturating_sub(1)
	}

	/// Find an atom by a dotted path, such as `moov.udta.meta`
	///
	/// Each component must be exactly four characters, each in the range `U+0000..=U+00FF`
	/// (so `©nam` is a valid component).
	///
	/// # Errors
	///
	/// * [`ErrorKind::InvalidArgument`] if a component isn't a valid identifier
	/// * [`ErrorKind::NotFound`] if no chain of atoms matches the path
	///
	/// # Examples
	///
	/// ```rust
	/// use std::io::Cursor;
	/// use tagsplice::config::ParseOptions;
	/// use tagsplice::mp4::{AtomTree, render};
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let udta = render(*b"udta", &[])?;
	/// let moov = render(*b"moov", &udta)?;
	///
	/// let tree = AtomTree::read_from(&mut Cursor::new(moov), ParseOptions::new())?;
	/// let udta = tree.find("moov.udta")?;
	/// assert_eq!(tree.get(udta).map(|atom| atom.position()), Some(8));
	///
	/// assert!(tree.find("moov.udta.meta").is_err());
	/// # Ok(()) }
	/// ```
	pub fn find(&self, path: &str) -> Result<AtomId> {
		let mut idents = Vec::new();
		for component in path.split('.') {
			idents.push(parse_ident(component)?);
		}

		self.find_path(&idents)
	}

	/// Find an atom by a path of identifiers
	///
	/// When multiple atoms share an identifier, every candidate is searched in file order and the
	/// first complete match is returned.
	///
	/// # Errors
	///
	/// See [`AtomTree::find`]
	pub fn find_path(&self, path: &[[u8; 4]]) -> Result<AtomId> {
		let Some((first, rest)) = path.split_first() else {
			err!(InvalidArgument("empty atom path"));
		};

		self.roots
			.iter()
			.filter(|id| self.nodes[id.0].ident == *first)
			.find_map(|&id| self.descend(id, rest))
			.ok_or_else(|| TagError::new(ErrorKind::NotFound))
	}

	fn descend(&self, id: AtomId, path: &[[u8; 4]]) -> Option<AtomId> {
		let Some((next, rest)) = path.split_first() else {
			return Some(id);
		};

		self.children(id)
			.iter()
			.filter(|child| self.nodes[child.0].ident == *next)
			.find_map(|&child| self.descend(child, rest))
	}

	/// Find the first direct child of `parent` with the identifier `ident`
	pub fn find_child(&self, parent: AtomId, ident: [u8; 4]) -> Option<AtomId> {
		self.children(parent)
			.iter()
			.copied()
			.find(|child| self.nodes[child.0].ident == ident)
	}

	/// Find every atom with the identifier `ident`, depth-first in file order
	pub fn find_all(&self, ident: [u8; 4]) -> FindAll<'_> {
		FindAll {
			tree: self,
			ident,
			stack: self.roots.iter().rev().copied().collect(),
		}
	}

	/// Read the payload of an atom
	///
	/// # Errors
	///
	/// * [`ErrorKind::InvalidArgument`] if the atom was removed
	/// * The payload is larger than the allocation limit
	/// * [`std::io::Error`]
	pub fn read_payload<R>(&self, reader: &mut R, id: AtomId) -> Result<Vec<u8>>
	where
		R: Read + Seek,
	{
		let node = self.node(id)?;

		let mut payload = try_vec![0; node.payload_len() as usize];
		reader.seek(SeekFrom::Start(node.data_offset()))?;
		reader.read_exact(&mut payload)?;

		Ok(payload)
	}

	/// Replace the payload of an atom
	///
	/// The atom keeps a 64-bit header if it had one, otherwise a 64-bit header is only used if the
	/// new size requires it. If the atom is a container, its children are parsed again from the new
	/// payload.
	///
	/// # Errors
	///
	/// * [`ErrorKind::InvalidArgument`] if the atom was removed
	/// * [`ErrorKind::PayloadTooLarge`] if an ancestor's 32-bit header can't hold its new size
	/// * [`ErrorKind::TooMuchData`] if a shifted 32-bit chunk offset overflows
	/// * [`std::io::Error`]
	pub fn replace<F>(&mut self, file: &mut F, id: AtomId, payload: &[u8]) -> Result<()>
	where
		F: SpliceTarget,
	{
		let node = self.node(id)?.clone();
		let rendered = render_with(node.ident, payload, node.extended)?;

		log::debug!(
			"MP4: Replacing {:?} at {}, size {} -> {}",
			String::from_utf8_lossy(&node.ident),
			node.position,
			node.size,
			rendered.len()
		);

		let delta = self.splice(file, node.position, node.size, &rendered, node.parent)?;

		let replaced = &mut self.nodes[id.0];
		replaced.size = rendered.len() as u64;
		replaced.extended = rendered.len() - payload.len() == EXTENDED_ATOM_HEADER_LEN as usize;

		if node.is_container() {
			self.detach_children(id);
			let depth = self.depth_of(id);
			self.parse_children(file, id, depth)?;
		}

		self.patch_offsets(file, node.position, rendered.len() as u64, delta)
	}

	/// Insert an already rendered atom as the `index`th child of `parent`
	///
	/// See [`render`](super::render) for creating the atom.
	///
	/// # Errors
	///
	/// * [`ErrorKind::InvalidArgument`]
	///   * `parent` isn't a container, or was removed
	///   * `index` is greater than the number of children
	///   * `atom` doesn't hold exactly one atom
	/// * See [`AtomTree::replace`]
	pub fn insert_child<F>(
		&mut self,
		file: &mut F,
		parent: AtomId,
		index: usize,
		atom: &[u8],
	) -> Result<AtomId>
	where
		F: SpliceTarget,
	{
		let parent_node = self.node(parent)?;
		let Some(siblings) = parent_node.children() else {
			err!(InvalidArgument("atom is not a container"));
		};

		let at = match siblings.get(index) {
			Some(sibling) => self.nodes[sibling.0].position,
			None if index == siblings.len() => parent_node.end(),
			None => err!(InvalidArgument("child index out of range")),
		};

		let mut info = AtomInfo::read(&mut Cursor::new(atom), atom.len() as u64, false)?;
		if info.len != atom.len() as u64 {
			err!(InvalidArgument("bytes must hold exactly one atom"));
		}

		log::debug!(
			"MP4: Inserting {:?} ({} bytes) at {at}",
			String::from_utf8_lossy(&info.ident),
			info.len
		);

		let depth = self.depth_of(parent);
		let delta = self.splice(file, at, 0, atom, Some(parent))?;

		info.start = at;
		let id = self.push_node(info, Some(parent));
		if CONTAINERS.contains(&info.ident) {
			self.parse_children(file, id, depth + 1)?;
		}

		if let Some(children) = &mut self.nodes[parent.0].children {
			children.insert(index, id);
		}

		self.patch_offsets(file, at, info.len, delta)?;
		Ok(id)
	}

	/// Append an already rendered atom as the last child of `parent`
	///
	/// # Errors
	///
	/// See [`AtomTree::insert_child`]
	pub fn append_child<F>(&mut self, file: &mut F, parent: AtomId, atom: &[u8]) -> Result<AtomId>
	where
		F: SpliceTarget,
	{
		let index = self.children(parent).len();
		self.insert_child(file, parent, index, atom)
	}

	/// Remove an atom and everything inside of it
	///
	/// # Errors
	///
	/// See [`AtomTree::replace`]
	pub fn remove<F>(&mut self, file: &mut F, id: AtomId) -> Result<()>
	where
		F: SpliceTarget,
	{
		let node = self.node(id)?.clone();

		log::debug!(
			"MP4: Removing {:?} at {}, size: {}",
			String::from_utf8_lossy(&node.ident),
			node.position,
			node.size
		);

		let delta = self.splice(file, node.position, node.size, &[], node.parent)?;

		match node.parent {
			Some(parent) => {
				if let Some(children) = &mut self.nodes[parent.0].children {
					children.retain(|child| *child != id);
				}
			},
			None => self.roots.retain(|root| *root != id),
		}

		self.mark_removed(id);
		self.patch_offsets(file, node.position, 0, delta)
	}

	// Replaces `old_len` bytes at `at` with `bytes`, and updates every ancestor starting at
	// `first_ancestor`. Returns the size delta.
	fn splice<F>(
		&mut self,
		file: &mut F,
		at: u64,
		old_len: u64,
		bytes: &[u8],
		first_ancestor: Option<AtomId>,
	) -> Result<i64>
	where
		F: SpliceTarget,
	{
		let new_len = bytes.len() as u64;
		let delta = size_delta(old_len, new_len)?;

		// Everything is checked before the file is touched
		let mut ancestors = Vec::new();
		let mut current = first_ancestor;
		while let Some(ancestor) = current {
			let node = &self.nodes[ancestor.0];

			let Some(new_size) = node.size.checked_add_signed(delta) else {
				err!(TooMuchData);
			};

			if !node.extended && new_size > u64::from(u32::MAX) {
				err!(PayloadTooLarge);
			}

			ancestors.push((ancestor, new_size));
			current = node.parent;
		}

		let Some(new_file_len) = self.file_len.checked_add_signed(delta) else {
			err!(TooMuchData);
		};

		// Tables inside of the replaced region go away with it
		if delta != 0 {
			let shift = OffsetShift {
				boundary: at,
				delta,
				skip: at..at + old_len,
			};
			check_offsets(file, self, &shift)?;
		}

		resize_bytes(file, old_len, new_len, at)?;
		if !bytes.is_empty() {
			file.seek(SeekFrom::Start(at))?;
			file.write_all(bytes)?;
		}

		for (ancestor, new_size) in ancestors {
			let node = &mut self.nodes[ancestor.0];

			log::trace!(
				"MP4: Updating {:?} size, {} -> {new_size}",
				String::from_utf8_lossy(&node.ident),
				node.size
			);

			node.size = new_size;
			write_atom_size(file, node.position, new_size, node.extended)?;
		}

		let old_end = at + old_len;
		for node in &mut self.nodes {
			if node.position >= old_end {
				node.position = node.position.saturating_add_signed(delta);
			}
		}

		self.file_len = new_file_len;
		file.flush()?;

		Ok(delta)
	}

	// The offsets were already checked by `splice`, tables within the `new_len` bytes written at
	// `at` belong to the caller and are left as is
	fn patch_offsets<F>(&self, file: &mut F, at: u64, new_len: u64, delta: i64) -> Result<()>
	where
		F: SpliceTarget,
	{
		if delta == 0 {
			return Ok(());
		}

		let shift = OffsetShift {
			boundary: at,
			delta,
			skip: at..at + new_len,
		};
		update_offsets(file, self, &shift)?;
		file.flush()?;

		Ok(())
	}

	fn detach_children(&mut self, id: AtomId) {
		let children = self.nodes[id.0].children.replace(Vec::new());
		for child in children.into_iter().flatten() {
			self.mark_removed(child);
		}
	}

	fn mark_removed(&mut self, id: AtomId) {
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			let node = &mut self.nodes[id.0];
			node.removed = true;

			if let Some(children) = &node.children {
				stack.extend(children.iter().copied());
			}
		}
	}
}

/// An iterator over every atom with a specific identifier
///
/// See [`AtomTree::find_all`]
pub struct FindAll<'a> {
	tree: &'a AtomTree,
	ident: [u8; 4],
	stack: Vec<AtomId>,
}

impl Iterator for FindAll<'_> {
	type Item = AtomId;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(id) = self.stack.pop() {
			let node = &self.tree.nodes[id.0];
			if let Some(children) = &node.children {
				self.stack.extend(children.iter().rev().copied());
			}

			if node.ident == self.ident {
				return Some(id);
			}
		}

		None
	}
}

fn parse_ident(component: &str) -> Result<[u8; 4]> {
	let mut ident = [0; 4];
	let mut len = 0;

	for c in component.chars() {
		let (Some(slot), Ok(byte)) = (ident.get_mut(len), u8::try_from(c)) else {
			err!(InvalidArgument(
				"atom identifiers must be four characters in the range U+0000..=U+00FF"
			));
		};

		*slot = byte;
		len += 1;
	}

	if len != ident.len() {
		err!(InvalidArgument(
			"atom identifiers must be four characters in the range U+0000..=U+00FF"
		));
	}

	Ok(ident)
}

fn size_delta(old_len: u64, new_len: u64) -> Result<i64> {
	let (Ok(old_len), Ok(new_len)) = (i64::try_from(old_len), i64::try_from(new_len)) else {
		err!(TooMuchData);
	};

	Ok(new_len - old_len)
}

// A full `meta` atom has a version (1) and flags (3) before its children. However, it's possible
// that it is written as a normal atom, meaning the next four bytes are the size of a child.
fn meta_skip<R>(reader: &mut R, data_offset: u64, payload_len: u64) -> Result<u64>
where
	R: Read + Seek,
{
	if payload_len < ATOM_HEADER_LEN {
		return Ok(payload_len.min(4));
	}

	let mut possible_ident = [0; 4];
	reader.seek(SeekFrom::Start(data_offset + 4))?;
	reader.read_exact(&mut possible_ident).map_err(truncated)?;

	if META_CHILDREN.contains(&possible_ident) {
		log::warn!("MP4: File contains a non-full 'meta' atom");
		return Ok(0);
	}

	Ok(4)
}

#[cfg(test)]
mod tests {
	use super::AtomTree;
	use crate::config::{ParseOptions, ParsingMode};
	use crate::error::ErrorKind;
	use crate::mp4::render;

	use std::io::Cursor;

	fn atom(ident: &[u8; 4], payload: &[u8]) -> Vec<u8> {
		render(*ident, payload).unwrap()
	}

	fn sample_file() -> Vec<u8> {
		let hdlr = atom(b"hdlr", &[0; 25]);
		let ilst = atom(b"ilst", &atom(b"\xA9nam", b"not parsed"));
		let mut meta_payload = vec![0; 4];
		meta_payload.extend(hdlr);
		meta_payload.extend(ilst);

		let udta = atom(b"udta", &atom(b"meta", &meta_payload));
		let trak = atom(b"trak", &atom(b"tkhd", &[0; 12]));

		let mut moov_payload = trak;
		moov_payload.extend(udta);

		let mut file = atom(b"ftyp", b"M4A ");
		file.extend(atom(b"moov", &moov_payload));
		file.extend(atom(b"mdat", &[1; 16]));
		file
	}

	#[test_log::test]
	fn parse_and_find() {
		let file = sample_file();
		let tree = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap();

		assert_eq!(tree.roots().len(), 3);

		let ilst = tree.find("moov.udta.meta.ilst").unwrap();
		let path = tree.path_to(ilst);
		let idents = path
			.iter()
			.map(|id| tree.get(*id).unwrap().ident())
			.collect::<Vec<_>>();
		assert_eq!(idents, [*b"moov", *b"udta", *b"meta", *b"ilst"]);

		// `meta` is a full atom, its children start 4 bytes into the payload
		let meta = tree.find("moov.udta.meta").unwrap();
		let hdlr = tree.children(meta)[0];
		assert_eq!(
			tree.get(hdlr).unwrap().position(),
			tree.get(meta).unwrap().data_offset() + 4
		);

		// `ilst` is a container, its items are leaves
		let nam = tree.find("moov.udta.meta.ilst.\u{a9}nam").unwrap();
		assert!(!tree.get(nam).unwrap().is_container());

		// `tkhd` isn't a container
		let tkhd = tree.find("moov.trak.tkhd").unwrap();
		assert!(tree.children(tkhd).is_empty());

		let err = tree.find("moov.udta.free").unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::NotFound));

		let err = tree.find("moov.ud").unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));
	}

	#[test_log::test]
	fn find_backtracks_over_siblings() {
		let first = atom(b"trak", &atom(b"tkhd", &[]));
		let second = atom(b"trak", &atom(b"mdia", &[]));

		let mut payload = first;
		payload.extend(second);
		let file = atom(b"moov", &payload);

		let tree = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap();
		let mdia = tree.find("moov.trak.mdia").unwrap();
		assert_eq!(tree.get(mdia).unwrap().position(), 8 + 16 + 8);
		assert_eq!(tree.find_all(*b"trak").count(), 2);
	}

	#[test_log::test]
	fn trailing_garbage() {
		let mut file = sample_file();
		file.extend_from_slice(&[0xFF; 5]);

		let tree = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap();
		assert_eq!(tree.roots().len(), 3);

		// An atom running past the end of the file
		let mut file = sample_file();
		file.extend_from_slice(b"\x00\x00\x10\x00free");

		let tree = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap();
		assert_eq!(tree.roots().len(), 3);

		let err = AtomTree::read_from(
			&mut Cursor::new(&file),
			ParseOptions::new().parsing_mode(ParsingMode::Strict),
		)
		.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::SizeMismatch));
	}

	#[test_log::test]
	fn truncated_extended_header() {
		let mut file = sample_file();
		file.extend_from_slice(b"\x00\x00\x00\x01mdat\x00\x00");

		let err = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::TruncatedHeader));
	}

	#[test_log::test]
	fn child_past_parent() {
		let mut moov_payload = atom(b"udta", &[]);
		// Claims 64 bytes, only 8 available
		moov_payload[3] = 64;
		let mut file = atom(b"moov", &moov_payload);
		file.extend(atom(b"mdat", &[0; 64]));

		let err = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::SizeMismatch));

		let tree = AtomTree::read_from(
			&mut Cursor::new(&file),
			ParseOptions::new().parsing_mode(ParsingMode::Relaxed),
		)
		.unwrap();
		let moov = tree.find("moov").unwrap();
		assert!(tree.children(moov).is_empty());
	}

	#[test_log::test]
	fn atom_to_eof() {
		let mut file = atom(b"ftyp", b"M4A ");
		file.extend_from_slice(b"\x00\x00\x00\x00mdat");
		file.extend_from_slice(&[0; 20]);

		let tree = AtomTree::read_from(&mut Cursor::new(&file), ParseOptions::new()).unwrap();
		let mdat = tree.find("mdat").unwrap();
		assert_eq!(tree.get(mdat).unwrap().size(), 28);
	}

	#[test_log::test]
	fn replace_propagates_sizes() {
		let mut file = Cursor::new(sample_file());
		let mut tree = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();

		let moov = tree.find("moov").unwrap();
		let udta = tree.find("moov.udta").unwrap();
		let meta = tree.find("moov.udta.meta").unwrap();
		let ilst = tree.find("moov.udta.meta.ilst").unwrap();
		let mdat = tree.find("mdat").unwrap();

		let sizes = |tree: &AtomTree| {
			[moov, udta, meta, ilst].map(|id| tree.get(id).unwrap().size())
		};

		let before = sizes(&tree);
		let mdat_before = tree.get(mdat).unwrap().position();

		let new_items = atom(b"\xA9ART", &[b'a'; 30]);
		tree.replace(&mut file, ilst, &new_items).unwrap();

		let old_items_len = before[3] - 8;
		let delta = new_items.len() as u64 - old_items_len;
		let after = sizes(&tree);
		for (before, after) in before.iter().zip(after) {
			assert_eq!(before + delta, after);
		}

		assert_eq!(tree.get(mdat).unwrap().position(), mdat_before + delta);
		assert_eq!(tree.file_len(), file.get_ref().len() as u64);

		// The old `©nam` is gone, replaced by `©ART`
		assert_eq!(tree.children(ilst).len(), 1);
		assert!(tree.find("moov.udta.meta.ilst.\u{a9}ART").is_ok());

		// A fresh parse agrees with the updated tree
		let reparsed = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();
		assert_eq!(sizes(&reparsed), after);
	}

	#[test_log::test]
	fn insert_and_remove_children() {
		let original = sample_file();
		let mut file = Cursor::new(original.clone());
		let mut tree = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();

		let moov = tree.find("moov").unwrap();
		let moov_size = tree.get(moov).unwrap().size();

		let free = atom(b"free", &[0; 8]);
		let id = tree.insert_child(&mut file, moov, 0, &free).unwrap();

		assert_eq!(tree.children(moov)[0], id);
		// After `ftyp` (12) and the `moov` header (8)
		assert_eq!(tree.get(id).unwrap().position(), 20);
		assert_eq!(tree.get(moov).unwrap().size(), moov_size + 16);

		let trak = tree.find("moov.trak").unwrap();
		assert_eq!(tree.get(trak).unwrap().position(), 20 + 16);

		tree.remove(&mut file, id).unwrap();
		assert!(tree.get(id).is_none());
		assert_eq!(file.get_ref(), &original);

		let err = tree
			.insert_child(&mut file, trak, 5, &free)
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

		let mdat = tree.find("mdat").unwrap();
		let err = tree.append_child(&mut file, mdat, &free).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

		let two_atoms = [free.clone(), free.clone()].concat();
		let err = tree.append_child(&mut file, moov, &two_atoms).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

		assert_eq!(file.get_ref(), &original);
	}

	#[test_log::test]
	fn header_cannot_grow_in_place() {
		let mut file = Cursor::new(sample_file());
		let mut tree = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();

		// Fake an ancestor that is on the edge of the 32-bit limit
		let moov = tree.find("moov").unwrap();
		tree.nodes[moov.0].size = u64::from(u32::MAX) - 4;

		let udta = tree.find("moov.udta").unwrap();
		let before = file.get_ref().clone();
		let err = tree
			.append_child(&mut file, udta, &atom(b"free", &[]))
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::PayloadTooLarge));
		assert_eq!(file.get_ref(), &before);
	}
}
