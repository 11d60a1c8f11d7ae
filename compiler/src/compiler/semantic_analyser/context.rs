use bitflags::bitflags;

bitflags! {
    /// Construct flags the analyser carries while descending. A bit is set
    /// on entry to the construct and cleared on exit only when that entry
    /// freshly set it, so nested loops keep the outer flag alive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Context: u8 {
        const FUNCTION = 1 << 0;
        const CLASS = 1 << 1;
        const FOR = 1 << 2;
        const WHILE = 1 << 3;
    }
}

impl Context {
    /// Set `flag`, returning whether the caller owns clearing it.
    pub fn enter(&mut self, flag: Context) -> bool {
        let freshly_set = !self.contains(flag);
        self.insert(flag);
        freshly_set
    }

    /// Clear `flag` if this caller's `enter` freshly set it.
    pub fn exit(&mut self, flag: Context, freshly_set: bool) {
        if freshly_set {
            self.remove(flag);
        }
    }

    pub fn in_loop(&self) -> bool {
        self.intersects(Context::FOR | Context::WHILE)
    }
}
