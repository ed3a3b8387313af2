// Play language frontend: lexer, parser, AST transformer, and semantic
// analyzer.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

pub mod ast;
pub mod compile;
pub mod cst;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantics;
pub mod symbol_table;
pub mod token;
pub mod transform;

pub use compile::compile_source;
pub use error::CompileError;
