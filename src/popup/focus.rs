use bitflags::bitflags;

bitflags! {
    /// Which links of the cascade a focus check may follow
    ///
    /// Each recursive step keeps only the direction it came from, so an
    /// upward walk never turns back down and the other way round.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        /// Walk towards the root through owners
        const OWNER = 1;
        /// Walk towards the leaf through open children
        const CHILD = 2;
    }
}
