/// Leaflet color names cycled by layer order.
pub const PALETTE: [&str; 9] = [
    "red",
    "blue",
    "green",
    "orange",
    "purple",
    "darkred",
    "lightblue",
    "cadetblue",
    "pink",
];

pub fn color_for(layer_index: usize) -> &'static str {
    PALETTE[layer_index % PALETTE.len()]
}
