use thermx::{point, DegradationController, ParameterModel, PropertySet, Truss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A 1 m steel bar held at one end and free to slide at the other
    let mut truss = Truss::new();
    let a = truss.add_joint(point(0.0, 0.0, 0.0));
    let b = truss.add_joint(point(1_000.0, 0.0, 0.0));
    truss.set_support(a, [true, true, true])?;
    truss.set_support(b, [false, true, true])?;
    let ab = truss.add_member(a, b);
    truss.set_member_properties(ab, 100.0, 210_000.0)?;

    // Bind the structural-steel model to every member
    let reference = PropertySet::from_iter([("Fy", 250.0), ("E", 210_000.0)]);
    let controller = DegradationController::new("EC3").initialize(&mut truss, 20.0, reference)?;

    // Heat the bar and let it expand freely
    let degraded = controller.update(&mut truss, 600.0)?;
    truss.run_analysis_step()?;

    for (key, value) in degraded.iter() {
        println!("{key} = {value:.4e}");
    }
    if let Some(displacement) = truss.joint_displacement(b) {
        println!("free end moves {:.4} mm", displacement.x);
    }

    Ok(())
}
