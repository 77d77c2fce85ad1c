#[cfg(test)]
mod inventory;
#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod util;
