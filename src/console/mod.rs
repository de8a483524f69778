//! Console help rendering.
//!
//! Commands are described by [`CommandInfo`] and collected into an
//! [`ApplicationInfo`]; [`TextDescriptor`] renders either one to an
//! [`OutputSink`].

mod command;
mod description;
mod descriptor;
mod output;

pub use command::{ApplicationInfo, CommandInfo, InputArgument, InputDefinition, InputOption};
pub use description::{ApplicationDescription, Namespace, GLOBAL_NAMESPACE};
pub use descriptor::{column_width, DescriptorOptions, TextDescriptor};
pub use output::{strip_tags, BufferedOutput, OutputSink, StreamOutput};
