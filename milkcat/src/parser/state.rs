use crate::parser::transition::Transition;
use crate::utils::FromU32;

/// Node id of the synthetic root.
pub const ROOT: usize = 0;

/// Node of the dependency tree under construction.
///
/// Only the leftmost and the rightmost direct children are tracked.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DependencyNode {
    head: Option<u32>,
    left_child: Option<u32>,
    right_child: Option<u32>,
    label: Option<u16>,
}

impl DependencyNode {
    #[inline(always)]
    pub fn head(&self) -> Option<usize> {
        self.head.map(usize::from_u32)
    }

    #[inline(always)]
    pub fn left_child(&self) -> Option<usize> {
        self.left_child.map(usize::from_u32)
    }

    #[inline(always)]
    pub fn right_child(&self) -> Option<usize> {
        self.right_child.map(usize::from_u32)
    }

    #[inline(always)]
    pub const fn label(&self) -> Option<u16> {
        self.label
    }
}

/// Configuration of the arc-eager system: a stack of node ids and a cursor
/// over the nodes, which serves as the buffer.
///
/// Node 0 is the root, and node `i` is the `i`-th word counted from 1.
pub struct ParserState {
    nodes: Vec<DependencyNode>,
    stack: Vec<u32>,
    stack_capacity: usize,
    cursor: usize,
}

impl ParserState {
    /// Creates a state for sentences of up to `max_len` words.
    pub fn new(max_len: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(max_len + 1),
            stack: Vec::with_capacity(max_len + 1),
            stack_capacity: max_len + 1,
            cursor: 1,
        }
    }

    /// Resets the state to the initial configuration over `len` words:
    /// the root on the stack and the cursor at the first word.
    pub fn reset(&mut self, len: usize) {
        debug_assert!(len < self.stack_capacity);
        self.nodes.clear();
        self.nodes.resize(len + 1, DependencyNode::default());
        self.stack.clear();
        self.stack.push(ROOT as u32);
        self.cursor = 1;
    }

    /// Gets the number of nodes including the root.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.size()
    }

    #[inline(always)]
    pub fn node(&self, id: usize) -> &DependencyNode {
        &self.nodes[id]
    }

    #[inline(always)]
    pub fn stack_top(&self) -> Option<usize> {
        self.stack.last().map(|&id| usize::from_u32(id))
    }

    /// Gets the `i`-th node of the buffer.
    #[inline(always)]
    pub fn input(&self, i: usize) -> Option<usize> {
        let id = self.cursor + i;
        (id < self.size()).then_some(id)
    }

    #[inline(always)]
    fn stack_is_full(&self) -> bool {
        self.stack.len() >= self.stack_capacity
    }

    /// Checks if `transition` can be applied.
    pub fn allows(&self, transition: Transition) -> bool {
        let buffer_left = self.cursor < self.size();
        match transition {
            Transition::Shift => {
                // The last word is not shifted while words wait on the stack.
                buffer_left
                    && !self.stack_is_full()
                    && (self.cursor + 1 < self.size() || self.stack.len() == 1)
            }
            Transition::Reduce => self
                .stack_top()
                .map_or(false, |top| top != ROOT && self.nodes[top].head.is_some()),
            Transition::LeftArc(_) => {
                buffer_left
                    && self
                        .stack_top()
                        .map_or(false, |top| top != ROOT && self.nodes[top].head.is_none())
            }
            Transition::RightArc(_) => {
                buffer_left && self.stack_top().is_some() && !self.stack_is_full()
            }
        }
    }

    /// Applies `transition`, which must be allowed.
    pub fn apply(&mut self, transition: Transition) {
        debug_assert!(self.allows(transition), "{transition:?} is not allowed");
        match transition {
            Transition::Shift => {
                self.stack.push(self.cursor as u32);
                self.cursor += 1;
            }
            Transition::Reduce => {
                self.stack.pop();
            }
            Transition::LeftArc(label) => {
                if let Some(dep) = self.stack.pop() {
                    self.attach(usize::from_u32(dep), self.cursor, label);
                }
            }
            Transition::RightArc(label) => {
                if let Some(head) = self.stack_top() {
                    self.attach(self.cursor, head, label);
                }
                self.stack.push(self.cursor as u32);
                self.cursor += 1;
            }
        }
    }

    /// Assigns the head of `dep`. A node never gets a second head.
    pub fn attach(&mut self, dep: usize, head: usize, label: u16) {
        debug_assert_ne!(dep, ROOT);
        debug_assert!(
            self.nodes[dep].head.is_none(),
            "node {dep} already has a head"
        );
        let node = &mut self.nodes[dep];
        node.head = Some(head as u32);
        node.label = Some(label);

        let dep_id = dep as u32;
        let head_node = &mut self.nodes[head];
        if dep < head {
            head_node.left_child = Some(head_node.left_child.map_or(dep_id, |c| c.min(dep_id)));
        } else {
            head_node.right_child = Some(head_node.right_child.map_or(dep_id, |c| c.max(dep_id)));
        }
    }
}
