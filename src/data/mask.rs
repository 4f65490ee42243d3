//! Out-of-scope masks over the instance id space.
//!
//! A [`ScopeMask`] holds one flag per instance id; `true` means the instance
//! is *out of scope* for the node the mask describes. The mask also tracks
//! how many ids are in scope, so child sizes are available without a scan.

/// Boolean out-of-scope mask with a cached in-scope count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMask {
    out: Vec<bool>,
    in_scope: usize,
}

impl ScopeMask {
    /// Mask with every id in scope.
    pub fn all_in(len: usize) -> Self {
        Self {
            out: vec![false; len],
            in_scope: len,
        }
    }

    /// Mask with every id out of scope.
    pub fn all_out(len: usize) -> Self {
        Self {
            out: vec![true; len],
            in_scope: 0,
        }
    }

    /// Build from raw out-of-scope flags.
    pub fn from_out_flags(out: Vec<bool>) -> Self {
        let in_scope = out.iter().filter(|&&o| !o).count();
        Self { out, in_scope }
    }

    /// Size of the id space.
    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    #[inline]
    pub fn is_out(&self, id: u32) -> bool {
        self.out[id as usize]
    }

    #[inline]
    pub fn is_in(&self, id: u32) -> bool {
        !self.out[id as usize]
    }

    /// Bring `id` into scope. No-op if it already is.
    #[inline]
    pub fn include(&mut self, id: u32) {
        let flag = &mut self.out[id as usize];
        if *flag {
            *flag = false;
            self.in_scope += 1;
        }
    }

    /// Take `id` out of scope. No-op if it already is.
    #[inline]
    pub fn exclude(&mut self, id: u32) {
        let flag = &mut self.out[id as usize];
        if !*flag {
            *flag = true;
            self.in_scope -= 1;
        }
    }

    /// Number of ids currently in scope.
    #[inline]
    pub fn in_scope_count(&self) -> usize {
        self.in_scope
    }

    /// In-scope ids in ascending order.
    pub fn in_scope_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.out
            .iter()
            .enumerate()
            .filter(|(_, out)| !**out)
            .map(|(id, _)| id as u32)
    }

    /// Raw out-of-scope flags.
    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.out
    }
}
