use glam::Vec2;

/// External input understood by [`crate::simulation::Simulation::handle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// A character was typed; spawns a node unless it is a control character.
    CharacterTyped(char),
    /// The commit key; closes the active cluster.
    Commit,
    Reset,
    /// Pointer position in world space, `None` when it left the canvas.
    PointerMoved(Option<Vec2>),
}
