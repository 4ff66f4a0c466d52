//! Flowfields are a means of handling pathfinding for a crowd of actors.
//!
//! [Fixing Pathfinding Once and For All](https://web.archive.org/web/20150905073624/http://www.ai-blog.net/archives/000152.html)
//!
//! [SupCom2- Elijah Emerson](https://www.gameaipro.com/GameAIPro/GameAIPro_Chapter23_Crowd_Pathfinding_and_Steering_Using_Flow_Field_Tiles.pdf)
//!
//! [jdxdev](https://www.jdxdev.com/blog/2020/05/03/flowfields/)
//!
//! [leifnode](https://leifnode.com/2013/12/flow-field-pathfinding/)
//!
//! A single grid covers the navigable world. Each cell of the grid carries
//! three values which the algorithm uses to calculate a field descending
//! towards one or more goals:
//!
//! ```text
//!  _____________________________
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! ```
//!
//! Definitions:
//!
//! * Cost field - 8-bit field where a value of `0` represents impassable
//! terrain and range 1 - 255 represents the cost of traversing that cell, 1
//! being the default and easiest. You could define a value of 56 for instance
//! as being a slope or swamp and in such a case pathfinding will try to avoid
//! it
//! * Integration field - uses the cost field as input and stores the
//! calculated cost-to-goal (cost to path to the nearest location you want to
//! end up at). Costs are fixed-point, an orthogonal step adds `10 x cost` and
//! a diagonal step `14 x cost`
//! * Flow field - a unit direction per cell pointing at the neighbour closest
//! to a goal, or zero at goals and in unreachable areas. Agents sample it
//! with bilinear interpolation so their heading changes smoothly from cell to
//! cell
//!
//! Generated fields are published as immutable snapshots and fields leading to
//! a single destination are cached so that asking for the same destination
//! again costs nothing.
//!

pub mod cache;
pub mod error;
pub mod fields;
pub mod generator;
pub mod grid;
pub mod surface;
pub mod utilities;
