use crate::plan::SheetPlan;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

pub fn render_sheet(sheet: &SheetPlan) -> String {
    if sheet.width == 0 || sheet.height == 0 {
        return String::new();
    }
    let scale = f64::min(
        MAX_WIDTH / sheet.width as f64,
        MAX_HEIGHT / sheet.height as f64,
    );
    let grid_w = (sheet.width as f64 * scale).round() as usize;
    let grid_h = (sheet.height as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in &sheet.placements {
        let sx = (p.x as f64 * scale).round() as usize;
        let sy = (p.y as f64 * scale).round() as usize;
        let sw = (p.width as f64 * scale).round() as usize;
        let sh = (p.height as f64 * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        // Prefer the label, fall back to the size when it doesn't fit
        let label = if p.label.is_empty() || p.label.chars().count() >= sw {
            format!("{}x{}", p.width, p.height)
        } else {
            p.label.clone()
        };
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn edge(current: char, line: char) -> char {
    let crossing = if line == '-' { '|' } else { '-' };
    if current == crossing || current == '+' {
        '+'
    } else {
        line
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in (x..=x + w).filter(|&i| i < cols) {
        for j in [y, y + h] {
            if j < rows {
                grid[j][i] = edge(grid[j][i], '-');
            }
        }
    }

    for j in (y..=y + h).filter(|&j| j < rows) {
        for i in [x, x + w] {
            if i < cols {
                grid[j][i] = edge(grid[j][i], '|');
            }
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlacedPiece;

    fn sheet(w: u32, h: u32, placements: Vec<PlacedPiece>) -> SheetPlan {
        SheetPlan {
            stock_index: 0,
            width: w,
            height: h,
            placements,
            used_area: 0,
            waste_area: 0,
            waste_percent: 0.0,
        }
    }

    fn piece(label: &str, x: u32, y: u32, w: u32, h: u32) -> PlacedPiece {
        PlacedPiece {
            label: label.into(),
            x,
            y,
            width: w,
            height: h,
            rotated: false,
        }
    }

    #[test]
    fn test_render_single_piece() {
        let output = render_sheet(&sheet(100, 50, vec![piece("", 0, 0, 100, 50)]));
        assert!(output.contains('+'));
        assert!(output.contains('-'));
        assert!(output.contains('|'));
        assert!(output.contains("100x50"));
    }

    #[test]
    fn test_render_labels() {
        let output = render_sheet(&sheet(
            100,
            100,
            vec![piece("door", 0, 0, 50, 100), piece("door", 50, 0, 50, 100)],
        ));
        assert_eq!(output.matches("door").count(), 2);
    }

    #[test]
    fn test_render_empty() {
        let output = render_sheet(&sheet(100, 100, vec![]));
        assert!(output.contains('+'));
        assert_eq!(render_sheet(&sheet(0, 100, vec![])), "");
    }
}
